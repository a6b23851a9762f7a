//! Persisted sync state and user settings.
//!
//! Everything that survives between runs lives in one JSON document:
//! settings, the stored credential, the connected account, the dedup index
//! and the last-sync timestamp. The default location is
//! `$XDG_CONFIG_HOME/bookmark-sync/state.json`, falling back to
//! `$HOME/.config/bookmark-sync/state.json`.

use std::env;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::auth::Credential;
use crate::index::DedupIndex;

/// Directory name under the config root.
pub const APP_DIR_NAME: &str = "bookmark-sync";

/// State file name.
pub const STATE_FILE_NAME: &str = "state.json";

/// Errors loading or saving persisted state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid state file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,

    /// A `config set` key or value was rejected.
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl StateError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// User-configurable settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Root of the note vault.
    pub vault_path: PathBuf,
    /// Vault-relative folder that receives the notes.
    pub bookmarks_folder: String,
    pub default_tags: Vec<String>,
    /// Upper bound on items fetched per run; zero means unlimited.
    pub max_items_per_sync: u32,
    /// Walk every page instead of stopping at already-synced items.
    pub full_sync: bool,
    pub url_type_detection: bool,
    /// Persist the index after this many created notes.
    pub flush_interval: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://127.0.0.1:8484/callback".to_string(),
            vault_path: PathBuf::from("."),
            bookmarks_folder: "Bookmarks".to_string(),
            default_tags: vec!["clippings".to_string()],
            max_items_per_sync: 0,
            full_sync: false,
            url_type_detection: true,
            flush_interval: 1,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("vault_path", &self.vault_path)
            .field("bookmarks_folder", &self.bookmarks_folder)
            .field("default_tags", &self.default_tags)
            .field("max_items_per_sync", &self.max_items_per_sync)
            .field("full_sync", &self.full_sync)
            .field("url_type_detection", &self.url_type_detection)
            .field("flush_interval", &self.flush_interval)
            .finish()
    }
}

impl Settings {
    /// Names accepted by [`set`](Self::set).
    pub const KEYS: [&'static str; 10] = [
        "client_id",
        "client_secret",
        "redirect_uri",
        "vault_path",
        "bookmarks_folder",
        "default_tags",
        "max_items_per_sync",
        "full_sync",
        "url_type_detection",
        "flush_interval",
    ];

    /// Updates one setting from its textual form.
    ///
    /// `default_tags` takes a comma-separated list.
    ///
    /// # Errors
    ///
    /// [`StateError::InvalidSetting`] for an unknown key or unparseable value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        let value = value.trim();
        match key {
            "client_id" => self.client_id = value.to_string(),
            "client_secret" => self.client_secret = value.to_string(),
            "redirect_uri" => {
                url::Url::parse(value).map_err(|e| StateError::invalid(key, e.to_string()))?;
                self.redirect_uri = value.to_string();
            }
            "vault_path" => self.vault_path = PathBuf::from(value),
            "bookmarks_folder" => {
                let folder = value.trim_matches('/');
                if folder.is_empty() {
                    return Err(StateError::invalid(key, "folder must not be empty"));
                }
                self.bookmarks_folder = folder.to_string();
            }
            "default_tags" => self.default_tags = parse_tag_list(value),
            "max_items_per_sync" => self.max_items_per_sync = parse_number(key, value)?,
            "flush_interval" => self.flush_interval = parse_number::<u32>(key, value)?.max(1),
            "full_sync" => self.full_sync = parse_bool(key, value)?,
            "url_type_detection" => self.url_type_detection = parse_bool(key, value)?,
            _ => {
                return Err(StateError::invalid(
                    key,
                    format!("unknown key (expected one of: {})", Self::KEYS.join(", ")),
                ));
            }
        }
        Ok(())
    }

    /// Settings as displayable `(key, value)` pairs; the secret is masked.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let secret = if self.client_secret.is_empty() {
            String::new()
        } else {
            "********".to_string()
        };
        vec![
            ("client_id", self.client_id.clone()),
            ("client_secret", secret),
            ("redirect_uri", self.redirect_uri.clone()),
            ("vault_path", self.vault_path.display().to_string()),
            ("bookmarks_folder", self.bookmarks_folder.clone()),
            ("default_tags", self.default_tags.join(",")),
            ("max_items_per_sync", self.max_items_per_sync.to_string()),
            ("full_sync", self.full_sync.to_string()),
            ("url_type_detection", self.url_type_detection.to_string()),
            ("flush_interval", self.flush_interval.to_string()),
        ]
    }
}

/// Splits a comma-separated tag list, dropping blanks.
#[must_use]
pub fn parse_tag_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, StateError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(StateError::invalid(key, format!("expected true/false, got '{value}'"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StateError> {
    value
        .parse()
        .map_err(|_| StateError::invalid(key, format!("expected a non-negative number, got '{value}'")))
}

/// The connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
}

/// Everything persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncState {
    pub settings: Settings,
    pub credential: Option<Credential>,
    pub account: Option<Account>,
    pub synced_items: DedupIndex,
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncState {
    /// True when both a credential and an account are stored.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.credential.as_ref().is_some_and(Credential::is_complete) && self.account.is_some()
    }

    /// Forgets the credential and account. The index and settings are kept.
    pub fn disconnect(&mut self) {
        self.credential = None;
        self.account = None;
    }
}

/// Where persisted state is loaded from and saved to.
///
/// This trait uses `async_trait` so the sync engine can hold a
/// `dyn StateStore`; tests substitute an in-memory store.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the state, or defaults when none was saved yet.
    async fn load(&self) -> Result<SyncState, StateError>;

    /// Persists the state.
    async fn save(&self, state: &SyncState) -> Result<(), StateError>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location.
    ///
    /// # Errors
    ///
    /// [`StateError::ConfigDirUnavailable`] if neither `XDG_CONFIG_HOME` nor
    /// `HOME` is set.
    pub fn at_default_path() -> Result<Self, StateError> {
        Ok(Self::new(default_state_path()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<SyncState, StateError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no state file yet, using defaults");
                return Ok(SyncState::default());
            }
            Err(err) => return Err(StateError::io(&self.path, err)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StateError::Json {
            path: self.path.clone(),
            source,
        })
    }

    #[instrument(level = "debug", skip(self, state), fields(path = %self.path.display()))]
    async fn save(&self, state: &SyncState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StateError::io(parent, e))?;
        }

        let payload = serde_json::to_vec_pretty(state).map_err(|source| StateError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Write beside the target and rename so readers never see a torn file.
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        tokio::fs::write(&tmp_path, &payload)
            .await
            .map_err(|e| StateError::io(&tmp_path, e))?;
        set_owner_only_permissions(&tmp_path).await?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StateError::io(&self.path, e))?;

        debug!(
            indexed = state.synced_items.len(),
            bytes = payload.len(),
            "state saved"
        );
        Ok(())
    }
}

#[cfg(unix)]
async fn set_owner_only_permissions(path: &Path) -> Result<(), StateError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(|e| StateError::io(path, e))
}

#[cfg(not(unix))]
async fn set_owner_only_permissions(_path: &Path) -> Result<(), StateError> {
    Ok(())
}

/// Default state file path.
///
/// # Errors
///
/// [`StateError::ConfigDirUnavailable`] if no config directory can be found.
pub fn default_state_path() -> Result<PathBuf, StateError> {
    resolve_config_dir(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
        .map(|dir| dir.join(STATE_FILE_NAME))
}

fn resolve_config_dir(
    xdg_config_home: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf, StateError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(PathBuf::from(xdg).join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME));
    }
    Err(StateError::ConfigDirUnavailable)
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.to_string_lossy().trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
