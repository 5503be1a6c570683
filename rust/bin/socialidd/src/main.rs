//! `socialidd` — the identity store daemon.
//!
//! Usage:
//!   socialidd -c <context-name-or-path> run
//!   socialidd -c <context-name-or-path> dump
//!   socialidd -c <context-name-or-path> user <username>
//!
//! The context name resolves to `/etc/socialid/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.
//!
//! Every command opens the database file itself, and redb allows one
//! process per file: `dump` and `user` fail while `run` holds the store.
//! Read the newest snapshot instead, or stop the daemon first.

mod dump;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use identity::{IdentityError, IdentityStore};
use socialid_core::StoreConfig;
use socialid_kv::KVError;
use tracing::info;

use crate::dump::DumpWorker;

/// Identity store daemon.
#[derive(Parser, Debug)]
#[command(name = "socialidd", about = "Social identity store daemon")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the store and take periodic snapshots until Ctrl-C.
    Run,
    /// Write one snapshot now and print its path.
    Dump,
    /// Print a user and its linked accounts as JSON.
    User {
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = StoreConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let config = StoreConfig::load(&config_path)?;

    std::fs::create_dir_all(&config.storage.data_dir)?;
    let db_path = config.resolve_db_path();
    let store = IdentityStore::open(&db_path).map_err(|e| match e {
        IdentityError::Storage(KVError::AlreadyOpen(_)) => anyhow::anyhow!(
            "identity store {} is held by another process (is `socialidd run` active?)",
            db_path.display()
        ),
        e => anyhow::anyhow!("failed to open identity store {}: {}", db_path.display(), e),
    })?;
    info!("Identity store opened at {}", db_path.display());

    let result = match cli.command {
        Command::Run => run(&store, &config).await,
        Command::Dump => dump_now(&store, config.resolve_dump_dir()),
        Command::User { username } => show_user(&store, &username),
    };

    store.close();
    result
}

async fn run(store: &IdentityStore, config: &StoreConfig) -> anyhow::Result<()> {
    let worker = if config.dump.enabled {
        Some(DumpWorker::start(
            store.kv().clone(),
            config.resolve_dump_dir(),
            Duration::from_secs(config.dump.interval_secs),
        ))
    } else {
        info!("Periodic dumps disabled");
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    if let Some(worker) = worker {
        worker.shutdown().await;
    }
    Ok(())
}

fn dump_now(store: &IdentityStore, dir: PathBuf) -> anyhow::Result<()> {
    let (path, stats) = dump::dump_once(store.kv(), &dir)?;
    info!(
        "{} entries, {} -> {} bytes",
        stats.entries, stats.uncompressed_size, stats.compressed_size
    );
    println!("{}", path.display());
    Ok(())
}

fn show_user(store: &IdentityStore, username: &str) -> anyhow::Result<()> {
    let Some(user) = store.get_user_by_username(username)? else {
        anyhow::bail!("unknown user '{}'", username);
    };
    let socials = store.list_socials(&user.social_ids)?;
    let out = serde_json::json!({ "user": user, "socials": socials });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
