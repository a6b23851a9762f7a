//! Integration tests for the OAuth login flow and token refresh.

use std::sync::Arc;

use bookmark_sync::auth::{
    AuthError, ClientApp, Credential, OAuthClient, TokenManager, parse_callback,
};
use chrono::{TimeDelta, Utc};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::start_mock_server_or_skip;

fn oauth_for(server: &MockServer) -> OAuthClient {
    OAuthClient::with_endpoints(
        format!("{}/i/oauth2/authorize", server.uri()),
        format!("{}/2/oauth2/token", server.uri()),
        format!("{}/2/users/me", server.uri()),
    )
}

fn public_app() -> ClientApp {
    ClientApp {
        client_id: "cid".to_string(),
        client_secret: String::new(),
        redirect_uri: "http://127.0.0.1:8484/callback".to_string(),
    }
}

fn token_body(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "token_type": "bearer",
        "access_token": access,
        "expires_in": 7200,
        "scope": "bookmark.read tweet.read users.read offline.access"
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    body
}

// ==================== Code Exchange Tests ====================

#[tokio::test]
async fn test_login_flow_exchanges_code_with_verifier() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let oauth = oauth_for(&server);
    let app = public_app();
    let request = oauth.authorization_request(&app);

    assert!(request.url.starts_with(&format!("{}/i/oauth2/authorize?", server.uri())));
    assert!(request.url.contains("code_challenge_method=S256"));
    assert!(request.url.contains(&format!("state={}", request.state)));

    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains(&format!("code_verifier={}", request.pkce.verifier())))
        .and(body_string_contains("client_id=cid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1", Some("rt-1"))))
        .expect(1)
        .mount(&server)
        .await;

    let redirect = format!(
        "http://127.0.0.1:8484/callback?state={}&code=the-code",
        request.state
    );
    let code = parse_callback(&redirect, &request.state).unwrap();
    let tokens = oauth.exchange_code(&app, &code, &request.pkce).await.unwrap();

    let now = Utc::now();
    let credential = Credential::from_token_response(&tokens, "cid", "", now);
    assert_eq!(credential.access_token, "at-1");
    assert_eq!(credential.refresh_token, "rt-1");
    assert_eq!(credential.remaining(now), TimeDelta::seconds(7200));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_confidential_client_uses_basic_auth() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let oauth = oauth_for(&server);
    let app = ClientApp {
        client_secret: "shh".to_string(),
        ..public_app()
    };
    let request = oauth.authorization_request(&app);

    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .and(header("authorization", "Basic Y2lkOnNoaA=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1", Some("rt-1"))))
        .expect(1)
        .mount(&server)
        .await;

    oauth.exchange_code(&app, "c", &request.pkce).await.unwrap();
}

#[tokio::test]
async fn test_rejected_exchange_surfaces_provider_description() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let oauth = oauth_for(&server);
    let app = public_app();
    let request = oauth.authorization_request(&app);

    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_request",
            "error_description": "Value passed for the authorization code was invalid."
        })))
        .mount(&server)
        .await;

    let err = oauth.exchange_code(&app, "bad", &request.pkce).await.unwrap_err();
    assert!(
        matches!(
            &err,
            AuthError::Rejected { status: 400, message }
                if message == "Value passed for the authorization code was invalid."
        ),
        "unexpected error: {err:?}"
    );
}

#[test]
fn test_callback_with_wrong_state_is_rejected() {
    let err = parse_callback("http://127.0.0.1:8484/callback?state=evil&code=c", "expected").unwrap_err();
    assert!(matches!(err, AuthError::StateMismatch));
}

// ==================== Account Tests ====================

#[tokio::test]
async fn test_fetch_current_user() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/2/users/me"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "42", "name": "Ada Lovelace", "username": "ada" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = oauth_for(&server).fetch_current_user("at-1").await.unwrap();
    assert_eq!(user.id, "42");
    assert_eq!(user.username, "ada");
}

// ==================== Refresh Tests ====================

fn expiring_credential(expires_in: TimeDelta) -> Credential {
    Credential {
        access_token: "at-old".to_string(),
        refresh_token: "rt-old".to_string(),
        expires_at: Utc::now() + expires_in,
        client_id: "cid".to_string(),
        client_secret: String::new(),
    }
}

#[tokio::test]
async fn test_token_manager_refreshes_near_expiry() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-old"))
        .and(body_string_contains("client_id=cid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-new", Some("rt-new"))))
        .expect(1)
        .mount(&server)
        .await;

    let manager = TokenManager::new(Arc::new(oauth_for(&server)));
    let mut credential = expiring_credential(TimeDelta::minutes(4));
    let token = manager.ensure_valid_token(Some(&mut credential)).await.unwrap();

    assert!(token.refreshed);
    assert_eq!(token.token, "at-new");
    assert_eq!(credential.refresh_token, "rt-new");
    assert!(credential.remaining(Utc::now()) > TimeDelta::minutes(100));
}

#[tokio::test]
async fn test_token_manager_keeps_fresh_token() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("unused", None)))
        .expect(0)
        .mount(&server)
        .await;

    let manager = TokenManager::new(Arc::new(oauth_for(&server)));
    let mut credential = expiring_credential(TimeDelta::minutes(10));
    let token = manager.ensure_valid_token(Some(&mut credential)).await.unwrap();

    assert!(!token.refreshed);
    assert_eq!(token.token, "at-old");
}

#[tokio::test]
async fn test_refresh_without_rotation_keeps_refresh_token() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-new", None)))
        .mount(&server)
        .await;

    let manager = TokenManager::new(Arc::new(oauth_for(&server)));
    let mut credential = expiring_credential(TimeDelta::minutes(-30));
    manager.ensure_valid_token(Some(&mut credential)).await.unwrap();

    assert_eq!(credential.access_token, "at-new");
    assert_eq!(credential.refresh_token, "rt-old");
}

#[tokio::test]
async fn test_failed_refresh_is_reported() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/2/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let manager = TokenManager::new(Arc::new(oauth_for(&server)));
    let mut credential = expiring_credential(TimeDelta::minutes(1));
    let err = manager.ensure_valid_token(Some(&mut credential)).await.unwrap_err();

    assert!(matches!(&err, AuthError::Rejected { status: 400, message } if message == "invalid_grant"));
    assert_eq!(credential.access_token, "at-old");
}
