//! End-to-end sync tests: mock bookmarks API, real vault directory and state file.

use std::path::Path;
use std::sync::Arc;

use bookmark_sync::api::BookmarksClient;
use bookmark_sync::auth::{Credential, OAuthClient, TokenManager};
use bookmark_sync::state::{Account, JsonStateStore, StateStore, SyncState};
use bookmark_sync::storage::{FsNoteStore, frontmatter};
use bookmark_sync::sync::{NoopObserver, SyncEngine, SyncError, SyncMode};
use chrono::{TimeDelta, Utc};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::{page, post, start_mock_server_or_skip};

const BOOKMARKS_PATH: &str = "/2/users/42/bookmarks";

struct Fixture {
    _dir: TempDir,
    vault: std::path::PathBuf,
    store: Arc<JsonStateStore>,
}

impl Fixture {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("vault");
        std::fs::create_dir_all(&vault).unwrap();
        let store = Arc::new(JsonStateStore::new(dir.path().join("state.json")));

        let mut state = SyncState {
            credential: Some(Credential {
                access_token: "at-1".to_string(),
                refresh_token: "rt-1".to_string(),
                expires_at: Utc::now() + TimeDelta::hours(2),
                client_id: "cid".to_string(),
                client_secret: String::new(),
            }),
            account: Some(Account {
                id: "42".to_string(),
                username: "me".to_string(),
            }),
            ..SyncState::default()
        };
        state.settings.vault_path.clone_from(&vault);
        store.save(&state).await.unwrap();

        Self {
            _dir: dir,
            vault,
            store,
        }
    }

    async fn engine(&self, server: &MockServer) -> SyncEngine {
        let state = self.store.load().await.unwrap();
        SyncEngine::new(
            Arc::new(BookmarksClient::with_base_url(format!("{}/2", server.uri()))),
            TokenManager::new(Arc::new(OAuthClient::with_endpoints(
                format!("{}/authorize", server.uri()),
                format!("{}/token", server.uri()),
                format!("{}/me", server.uri()),
            ))),
            Arc::new(FsNoteStore::new(&self.vault)),
            self.store.clone(),
            state,
        )
    }

    fn folder(&self) -> std::path::PathBuf {
        self.vault.join("Bookmarks")
    }

    fn note_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.folder())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

async fn mount_first_page(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(BOOKMARKS_PATH))
        .and(query_param_is_missing("pagination_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ==================== Happy Path Tests ====================

#[tokio::test]
async fn test_sync_writes_notes_and_persists_index() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let fixture = Fixture::new().await;

    mount_first_page(
        &server,
        page(
            vec![post("101", "Hello world. Extra stuff."), post("102", "Second thought here!")],
            Some("page-2"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(BOOKMARKS_PATH))
        .and(query_param("pagination_token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![post("103", "lol")], None)))
        .expect(1)
        .mount(&server)
        .await;

    let result = fixture.engine(&server).await.sync(SyncMode::Incremental, &NoopObserver).await;

    assert!(result.is_success(), "errors: {:?}", result.errors);
    assert_eq!((result.fetched, result.created, result.skipped), (3, 3, 0));
    assert_eq!(
        fixture.note_names(),
        vec!["Ada Lovelace tweet 103.md", "Hello world.md", "Second thought here.md"]
    );

    let note = read(&fixture.folder().join("Hello world.md"));
    assert!(note.starts_with("---\ntype:\n  - tweet\ntitle: Hello world\n"));
    assert!(note.contains("source: https://x.com/ada/status/101\n"));
    assert!(note.contains("author:\n  - Ada Lovelace\n"));
    assert!(note.contains("tags:\n  - clippings\n"));
    assert!(note.contains("published_date: 2024-05-01\n"));
    assert!(note.contains("**Ada Lovelace** @ada [2024-05-01](https://x.com/ada/status/101)"));

    let saved = fixture.store.load().await.unwrap();
    assert_eq!(saved.synced_items.len(), 3);
    assert_eq!(saved.synced_items.filename("101"), Some("Hello world.md"));
    assert!(saved.last_sync.is_some());
}

#[tokio::test]
async fn test_second_sync_creates_nothing() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let fixture = Fixture::new().await;

    mount_first_page(
        &server,
        page(
            vec![
                post("1", "First bookmark text."),
                post("2", "Second bookmark text."),
                post("3", "Third bookmark text."),
                post("4", "Fourth bookmark text."),
            ],
            Some("older"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(BOOKMARKS_PATH))
        .and(query_param("pagination_token", "older"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(Vec::new(), None)))
        .expect(1)
        .mount(&server)
        .await;

    let first = fixture.engine(&server).await.sync(SyncMode::Incremental, &NoopObserver).await;
    assert_eq!(first.created, 4);

    let second = fixture.engine(&server).await.sync(SyncMode::Incremental, &NoopObserver).await;
    assert!(second.is_success());
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(fixture.note_names().len(), 4);
}

#[tokio::test]
async fn test_external_link_sets_type_and_link() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let fixture = Fixture::new().await;

    let mut linked = post("7", "Check this out https://t.co/abc");
    linked["entities"] = json!({
        "urls": [{
            "start": 15,
            "end": 31,
            "url": "https://t.co/abc",
            "expanded_url": "https://github.com/rust-lang/rust",
            "display_url": "github.com/rust-lang/rust"
        }]
    });
    mount_first_page(&server, page(vec![linked], None)).await;

    let result = fixture.engine(&server).await.sync(SyncMode::Incremental, &NoopObserver).await;
    assert_eq!(result.created, 1);

    let names = fixture.note_names();
    let note = read(&fixture.folder().join(&names[0]));
    assert!(note.contains("type:\n  - code\n"));
    assert_eq!(
        frontmatter::read_field(&note, "link").unwrap().as_deref(),
        Some("https://github.com/rust-lang/rust")
    );
    assert!(note.contains("Check this out https://github.com/rust-lang/rust"));
}

// ==================== Existing Vault Tests ====================

#[tokio::test]
async fn test_existing_notes_are_indexed_not_duplicated() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let fixture = Fixture::new().await;
    std::fs::create_dir_all(fixture.folder()).unwrap();
    std::fs::write(
        fixture.folder().join("Kept from before.md"),
        "---\ntitle: Kept\nsource: https://twitter.com/ada/status/1\n---\n\nold body\n",
    )
    .unwrap();
    std::fs::write(fixture.folder().join("Hello world.md"), "no header\n").unwrap();

    mount_first_page(
        &server,
        page(vec![post("1", "Already saved."), post("2", "Hello world. Again.")], None),
    )
    .await;

    let result = fixture.engine(&server).await.sync(SyncMode::Incremental, &NoopObserver).await;

    assert_eq!((result.created, result.skipped), (1, 1));
    assert_eq!(
        fixture.note_names(),
        vec!["Hello world (2).md", "Hello world.md", "Kept from before.md"]
    );
    assert_eq!(read(&fixture.folder().join("Hello world.md")), "no header\n");
    let saved = fixture.store.load().await.unwrap();
    assert_eq!(saved.synced_items.filename("1"), Some("Kept from before.md"));
}

// ==================== Failure Tests ====================

#[tokio::test]
async fn test_remote_failure_is_the_only_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let fixture = Fixture::new().await;

    Mock::given(method("GET"))
        .and(path(BOOKMARKS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("over capacity"))
        .mount(&server)
        .await;

    let result = fixture.engine(&server).await.sync(SyncMode::Incremental, &NoopObserver).await;

    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.errors[0], SyncError::Remote { status: 503, .. }));
    assert!(fixture.note_names().is_empty());
    assert!(fixture.store.load().await.unwrap().last_sync.is_none());
}

#[tokio::test]
async fn test_disconnected_state_does_not_call_api() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let fixture = Fixture::new().await;
    let mut state = fixture.store.load().await.unwrap();
    state.disconnect();
    fixture.store.save(&state).await.unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(Vec::new(), None)))
        .expect(0)
        .mount(&server)
        .await;

    let result = fixture.engine(&server).await.sync(SyncMode::Incremental, &NoopObserver).await;
    assert!(matches!(result.errors.as_slice(), [SyncError::NotAuthenticated]));
}
