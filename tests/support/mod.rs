//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::TcpListener;
use std::panic::Location;

use serde_json::{Value, json};
use wiremock::MockServer;

#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var("BOOKMARK_SYNC_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

#[track_caller]
#[must_use]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let location = Location::caller();
    let message = format!(
        "[socket-bound-test] cannot bind localhost socket at {}:{}; wiremock-based test cannot run in this environment",
        location.file(),
        location.line()
    );
    assert!(
        !socket_tests_required(),
        "{message}. Set BOOKMARK_SYNC_REQUIRE_SOCKET_TESTS=0 to allow local skip behavior."
    );

    eprintln!("{message}. Skipping test. Set BOOKMARK_SYNC_REQUIRE_SOCKET_TESTS=1 to fail-fast instead.");
    true
}

pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some(MockServer::start().await)
    }
}

/// One bookmarked post by user `7` (`@ada`).
#[must_use]
pub fn post(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "text": text,
        "author_id": "7",
        "created_at": "2024-05-01T12:00:00.000Z"
    })
}

/// A bookmarks page with the given posts and optional continuation token.
#[must_use]
pub fn page(posts: Vec<Value>, next_token: Option<&str>) -> Value {
    let mut meta = json!({ "result_count": posts.len() });
    if let Some(token) = next_token {
        meta["next_token"] = json!(token);
    }
    json!({
        "data": posts,
        "includes": {
            "users": [{ "id": "7", "name": "Ada Lovelace", "username": "ada" }]
        },
        "meta": meta
    })
}
