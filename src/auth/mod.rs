//! Account connection and OAuth token lifecycle.
//!
//! The login flow is an OAuth 2.0 authorization-code grant with PKCE. Once
//! connected, [`TokenManager`] keeps the stored [`Credential`] fresh before
//! every sync run.

mod credential;
mod error;
mod oauth;
mod pkce;
mod token;

pub use credential::Credential;
pub use error::AuthError;
pub use oauth::{
    AuthorizationRequest, ClientApp, DEFAULT_AUTHORIZE_URL, DEFAULT_ME_URL, DEFAULT_TOKEN_URL,
    OAuthClient, TokenRefresher, TokenResponse,
};
pub use pkce::{DEFAULT_SCOPES, PkceChallenge, build_authorization_url, generate_state, parse_callback};
pub use token::{AccessToken, REFRESH_MARGIN_MINUTES, TokenManager};
