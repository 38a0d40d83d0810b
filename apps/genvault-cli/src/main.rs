//! # GenVault CLI (`genvault`)
//!
//! Thin host around the content engine: stores a generated file as a
//! content record, loads it back through the backend priority chain, and
//! shows record metadata.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `genvault store <file> --mime <type>` | Save a file as a new record |
//! | `genvault load <id>` | Write a record's content to a file or stdout |
//! | `genvault inspect <id>` | Print a record's metadata as JSON |
//! | `genvault resolve ...` | Show which copy wins a version/time conflict |

mod commands;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use genvault_content::{ContentError, StoreConfig};
use genvault_protocol::StorageMode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use commands::StoreArgs;

#[derive(Parser)]
#[command(name = "genvault", version, about = "Multi-tier storage for generated content")]
struct Cli {
    /// Path to the store configuration (JSON). Missing file means defaults.
    #[arg(long, global = true, default_value = "./genvault.json")]
    config: PathBuf,

    /// Root directory holding one sub-directory per record.
    #[arg(long, global = true, default_value = "./genvault-data")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a file as a new content record.
    ///
    /// Text is stored inline when small. Embeddings are read as a JSON
    /// array of numbers. Everything else is written to a data file.
    Store {
        file: PathBuf,

        /// MIME type of the content, e.g. `audio/mpeg`.
        #[arg(long)]
        mime: String,

        /// Storage mode (`local`, `remote`, `hybrid`). Defaults to the config.
        #[arg(long)]
        mode: Option<StorageMode>,

        /// File name inside the record directory (binary content only).
        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value = "cli")]
        provider: String,

        #[arg(long, default_value = "cli")]
        requestor: String,
    },

    /// Write a record's content to `--out`, or stdout.
    Load {
        id: Uuid,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print a record's metadata.
    Inspect { id: Uuid },

    /// Decide which of two divergent copies wins.
    Resolve {
        #[arg(long)]
        local_version: u64,

        /// RFC 3339 timestamp of the local copy.
        #[arg(long)]
        local_time: DateTime<Utc>,

        #[arg(long)]
        remote_version: u64,

        /// RFC 3339 timestamp of the remote copy.
        #[arg(long)]
        remote_time: DateTime<Utc>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StoreConfig::load(&cli.config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let result = run(cli.command, &config, &cli.root, cancel).await;
    if let Err(e) = &result
        && let Some(content_err) = e.downcast_ref::<ContentError>()
    {
        eprintln!("hint: {}", content_err.recovery_suggestion());
    }
    result
}

async fn run(
    command: Commands,
    config: &StoreConfig,
    root: &std::path::Path,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Commands::Store {
            file,
            mime,
            mode,
            name,
            provider,
            requestor,
        } => {
            let args = StoreArgs {
                file,
                mime,
                mode,
                name,
                provider,
                requestor,
            };
            let record = commands::store(config, root, args, cancel).await?;
            println!("{}", record.id());
        }
        Commands::Load { id, out } => {
            let bytes = commands::load(config, root, id, cancel).await?;
            match out {
                Some(path) => tokio::fs::write(&path, &bytes).await?,
                None => {
                    use tokio::io::AsyncWriteExt;
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&bytes).await?;
                    stdout.flush().await?;
                }
            }
        }
        Commands::Inspect { id } => {
            let metadata = commands::inspect(root, id).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Resolve {
            local_version,
            local_time,
            remote_version,
            remote_time,
        } => {
            let resolution =
                commands::resolve((local_version, local_time), (remote_version, remote_time));
            println!("{resolution:?}");
        }
    }
    Ok(())
}
