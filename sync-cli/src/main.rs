//! # devbits-sync
//!
//! CLI tool for inspecting and editing DevBits local sync state.
//!
//! ## Commands
//!
//! - `prefs show`: Print the hydrated preferences
//! - `prefs set`: Change one preference
//! - `saved list`: Print saved post or followed stream ids
//! - `saved toggle`: Flip membership of one id
//!
//! ## Example
//!
//! ```bash
//! # Show preferences for the anonymous identity
//! devbits-sync prefs show
//!
//! # Turn on background refresh every minute
//! devbits-sync prefs set backgroundRefreshEnabled true
//! devbits-sync prefs set refreshIntervalMs 60000
//!
//! # Save post 42
//! devbits-sync saved toggle --kind posts 42
//! ```
//!
//! There is no backend connection: `--user` runs use an offline remote, so
//! reads fall back to empty state and toggles report the remote as
//! unavailable.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use devbits_sync_client::{FileStorage, OfflineRemote, SavedKind, SyncContext};
use devbits_sync_types::Identity;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{prefs, saved};

/// CLI tool for inspecting and editing DevBits local sync state.
#[derive(Parser, Debug)]
#[command(name = "devbits-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for persisted sync state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Client configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Signed-in username (omit for anonymous)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read or change preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },

    /// Read or toggle saved posts and followed streams
    Saved {
        #[command(subcommand)]
        command: SavedCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    /// Print the hydrated preferences as JSON
    Show,

    /// Apply a one-field change and print the result
    Set {
        /// Preference name (camelCase, e.g. refreshIntervalMs)
        key: String,

        /// New value as JSON (bare words are taken as strings)
        value: String,
    },
}

#[derive(Subcommand, Debug)]
enum SavedCommand {
    /// Print the ids in a set
    List {
        /// Which set
        #[arg(long, value_enum)]
        kind: KindArg,
    },

    /// Flip membership of one id and print the new membership
    Toggle {
        /// Which set
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Post or stream id
        id: i64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Posts,
    Streams,
}

impl From<KindArg> for SavedKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Posts => SavedKind::Posts,
            KindArg::Streams => SavedKind::Streams,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = config::resolve(cli.data_dir.as_deref(), cli.config.as_deref())?;
    tokio::fs::create_dir_all(&settings.data_dir)
        .await
        .context("Failed to create data directory")?;
    tracing::debug!("Using data directory {}", settings.data_dir.display());

    let ctx = SyncContext::new(
        Arc::new(FileStorage::new(&settings.data_dir)),
        Arc::new(OfflineRemote),
        settings.client,
    );
    ctx.set_identity(Identity::from_optional(cli.user.as_deref()))
        .await;

    match cli.command {
        Commands::Prefs { command } => match command {
            PrefsCommand::Show => {
                prefs::show(&ctx)?;
            }
            PrefsCommand::Set { key, value } => {
                prefs::set(&ctx, &key, &value).await?;
            }
        },
        Commands::Saved { command } => match command {
            SavedCommand::List { kind } => {
                saved::list(&ctx, kind.into());
            }
            SavedCommand::Toggle { kind, id } => {
                saved::toggle(&ctx, kind.into(), id).await?;
            }
        },
    }

    ctx.shutdown();
    Ok(())
}
