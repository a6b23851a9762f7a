//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Mirror your bookmarks into markdown notes.
///
/// Each bookmarked post becomes one note with a metadata header, written into
/// a folder of your note vault. Notes are never overwritten; re-running only
/// adds what is new.
#[derive(Parser, Debug)]
#[command(name = "bookmark-sync")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// State file to use instead of the default under the config directory
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch bookmarks and write notes for new ones
    Sync(SyncArgs),

    /// Rebuild the dedup index from the notes already in the vault
    RebuildIndex(VaultArgs),

    /// Connect or disconnect your account
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Show connection state, last sync and settings
    Status,

    /// Show or change persisted settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Vault location overrides, applied to this run only.
#[derive(Args, Debug, Clone, Default)]
pub struct VaultArgs {
    /// Vault root directory
    #[arg(long, value_name = "DIR")]
    pub vault: Option<PathBuf>,

    /// Folder inside the vault that receives the notes
    #[arg(long, value_name = "FOLDER")]
    pub folder: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Walk every page instead of stopping at already-synced bookmarks
    #[arg(long)]
    pub full: bool,

    /// Maximum bookmarks to fetch this run (0 for unlimited)
    #[arg(long, value_name = "N")]
    pub max: Option<u32>,

    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    #[command(flatten)]
    pub vault: VaultArgs,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Authorize this tool with your account (OAuth 2.0 with PKCE)
    Login(LoginArgs),

    /// Forget the stored credential and account
    Logout,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// OAuth client id (saved for later runs)
    #[arg(long)]
    pub client_id: Option<String>,

    /// OAuth client secret, for confidential clients (saved for later runs)
    #[arg(long)]
    pub client_secret: Option<String>,

    /// Redirect URI registered for the client (saved for later runs)
    #[arg(long)]
    pub redirect_uri: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print every setting
    Show,

    /// Change one setting
    Set {
        /// Setting name, e.g. `bookmarks_folder`
        key: String,
        /// New value; lists are comma-separated
        value: String,
    },
}
