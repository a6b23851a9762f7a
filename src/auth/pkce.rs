//! PKCE helpers for the authorization-code flow (RFC 7636).
//!
//! The CLI cannot host a long-lived callback server, so the login flow prints
//! the authorization URL and reads the redirect back from the user.
//! [`parse_callback`] validates what they paste.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

use super::error::AuthError;

/// Scopes required to read bookmarks and keep a refresh token.
pub const DEFAULT_SCOPES: &str = "bookmark.read tweet.read users.read offline.access";

/// A PKCE code verifier and its S256 challenge.
#[derive(Clone)]
pub struct PkceChallenge {
    verifier: String,
    challenge: String,
}

impl PkceChallenge {
    /// Generates a random verifier (32 bytes of entropy) and its challenge.
    #[must_use]
    pub fn generate() -> Self {
        let random_bytes: [u8; 32] = rand::thread_rng().r#gen();
        Self::from_verifier(URL_SAFE_NO_PAD.encode(random_bytes))
    }

    /// Builds the challenge for a known verifier.
    #[must_use]
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }

    /// Sent with the token exchange.
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Sent with the authorization request.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("verifier", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Generates a random `state` value for CSRF protection.
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::thread_rng().r#gen();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Builds the URL the user opens to authorize the application.
#[must_use]
pub fn build_authorization_url(
    authorize_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    pkce: &PkceChallenge,
) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
        authorize_url,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(DEFAULT_SCOPES),
        urlencoding::encode(state),
        urlencoding::encode(pkce.challenge()),
    )
}

/// Extracts the authorization code from what the user pasted.
///
/// Accepts the full redirect URL, a bare query string (`code=...&state=...`),
/// or the bare code. When a query is present its `state` must equal
/// `expected_state`, and an `error` parameter is reported as
/// [`AuthError::Denied`].
///
/// # Errors
///
/// [`AuthError::Denied`], [`AuthError::StateMismatch`] or
/// [`AuthError::MissingCode`].
pub fn parse_callback(input: &str, expected_state: &str) -> Result<String, AuthError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::MissingCode);
    }

    let query = match Url::parse(input) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) if input.contains('=') => input.trim_start_matches('?').to_string(),
        Err(_) => return Ok(input.to_string()),
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(AuthError::Denied {
            reason: error_description.unwrap_or(error),
        });
    }
    let code = code.filter(|c| !c.is_empty()).ok_or(AuthError::MissingCode)?;
    if state.as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }
    Ok(code)
}
