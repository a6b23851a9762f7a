//! OAuth 2.0 endpoints: code exchange, refresh and account lookup.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::credential::Credential;
use super::error::AuthError;
use super::pkce::{PkceChallenge, build_authorization_url, generate_state};
use crate::api::types::{User, UserMeResponse};

/// Authorization page the user opens in a browser.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://x.com/i/oauth2/authorize";

/// Token exchange and refresh endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://api.x.com/2/oauth2/token";

/// Current-user endpoint.
pub const DEFAULT_ME_URL: &str = "https://api.x.com/2/users/me";

/// Successful response from the token endpoint.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Registered application used for the authorization-code flow.
#[derive(Clone)]
pub struct ClientApp {
    pub client_id: String,
    /// Empty for public clients.
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for ClientApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientApp")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Everything needed to finish a login after the user authorizes.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// URL to open in the browser.
    pub url: String,
    /// Expected `state` on the redirect.
    pub state: String,
    pub pkce: PkceChallenge,
}

/// Exchanges a refresh token for a new token pair.
///
/// This trait uses `async_trait` so the token manager can hold a
/// `dyn TokenRefresher`; tests substitute a stub.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Refreshes `credential`, returning the provider's raw response.
    async fn refresh(&self, credential: &Credential) -> Result<TokenResponse, AuthError>;
}

/// Client for the provider's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: Client,
    authorize_url: String,
    token_url: String,
    me_url: String,
}

impl Default for OAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OAuthClient {
    /// Creates a client for the production endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoints(DEFAULT_AUTHORIZE_URL, DEFAULT_TOKEN_URL, DEFAULT_ME_URL)
    }

    /// Creates a client for custom endpoints (used by tests).
    #[must_use]
    pub fn with_endpoints(
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
        me_url: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            authorize_url: authorize_url.into(),
            token_url: token_url.into(),
            me_url: me_url.into(),
        }
    }

    /// Starts a login: fresh PKCE pair, fresh state, and the URL to open.
    #[must_use]
    pub fn authorization_request(&self, app: &ClientApp) -> AuthorizationRequest {
        let pkce = PkceChallenge::generate();
        let state = generate_state();
        let url = build_authorization_url(
            &self.authorize_url,
            &app.client_id,
            &app.redirect_uri,
            &state,
            &pkce,
        );
        AuthorizationRequest { url, state, pkce }
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// [`AuthError::Rejected`] if the endpoint refuses the code, otherwise
    /// network or decode errors.
    #[instrument(skip(self, code, pkce), fields(client_id = %app.client_id))]
    pub async fn exchange_code(
        &self,
        app: &ClientApp,
        code: &str,
        pkce: &PkceChallenge,
    ) -> Result<TokenResponse, AuthError> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("code", code)
            .append_pair("grant_type", "authorization_code")
            .append_pair("client_id", &app.client_id)
            .append_pair("redirect_uri", &app.redirect_uri)
            .append_pair("code_verifier", pkce.verifier())
            .finish();
        self.token_request(&app.client_id, &app.client_secret, form)
            .await
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// [`AuthError::Rejected`] if the refresh token is no longer valid,
    /// otherwise network or decode errors.
    #[instrument(skip(self, client_secret, refresh_token))]
    pub async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenResponse, AuthError> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("refresh_token", refresh_token)
            .append_pair("grant_type", "refresh_token")
            .append_pair("client_id", client_id)
            .finish();
        self.token_request(client_id, client_secret, form).await
    }

    /// Looks up the account that owns `access_token`.
    ///
    /// # Errors
    ///
    /// [`AuthError::Rejected`] on a non-success status, otherwise network or
    /// decode errors.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let response = self
            .http
            .get(&self.me_url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::network(&self.me_url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::network(&self.me_url, e))?;
        if !status.is_success() {
            return Err(AuthError::rejected(status.as_u16(), text));
        }

        let me: UserMeResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::decode(&self.me_url, e))?;
        debug!(user_id = %me.data.id, username = %me.data.username, "resolved current user");
        Ok(me.data)
    }

    async fn token_request(
        &self,
        client_id: &str,
        client_secret: &str,
        form: String,
    ) -> Result<TokenResponse, AuthError> {
        let mut request = self
            .http
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(form);
        if !client_secret.is_empty() {
            request = request.basic_auth(client_id, Some(client_secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::network(&self.token_url, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::network(&self.token_url, e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorResponse>(&text)
                .ok()
                .and_then(|err| err.error_description.or(err.error))
                .unwrap_or(text);
            return Err(AuthError::rejected(status.as_u16(), message));
        }

        serde_json::from_str(&text).map_err(|e| AuthError::decode(&self.token_url, e))
    }
}

#[async_trait]
impl TokenRefresher for OAuthClient {
    async fn refresh(&self, credential: &Credential) -> Result<TokenResponse, AuthError> {
        self.refresh_token(
            &credential.client_id,
            &credential.client_secret,
            &credential.refresh_token,
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_debug_redacts() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"at-secret","refresh_token":"rt-secret","expires_in":7200,"scope":"tweet.read"}"#,
        )
        .unwrap();
        let debug = format!("{response:?}");
        assert!(!debug.contains("at-secret"));
        assert!(!debug.contains("rt-secret"));
        assert!(debug.contains("7200"));
    }

    #[test]
    fn test_token_response_minimal_payload() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(response.access_token, "a");
        assert!(response.refresh_token.is_none());
        assert!(response.expires_in.is_none());
    }

    #[test]
    fn test_authorization_request_uses_configured_endpoint() {
        let client = OAuthClient::with_endpoints(
            "https://auth.example/authorize",
            "https://auth.example/token",
            "https://auth.example/me",
        );
        let app = ClientApp {
            client_id: "cid".to_string(),
            client_secret: String::new(),
            redirect_uri: "http://127.0.0.1:8484/callback".to_string(),
        };

        let request = client.authorization_request(&app);
        assert!(request.url.starts_with("https://auth.example/authorize?"));
        assert!(request.url.contains(&format!("state={}", request.state)));
        assert!(request.url.contains(request.pkce.challenge()));
    }

    #[test]
    fn test_client_app_debug_redacts_secret() {
        let app = ClientApp {
            client_id: "cid".to_string(),
            client_secret: "hush".to_string(),
            redirect_uri: "http://localhost".to_string(),
        };
        assert!(!format!("{app:?}").contains("hush"));
    }
}
