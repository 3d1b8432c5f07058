//! harbor diagnostic console.
//!
//! Developer-facing inspection of the agent's cache state: list what is
//! cached, wipe every store the agent created, or print manual
//! uninstallation guidance. No production behavior depends on this tool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use harbor_core::{CacheDb, CacheIdentity, config::AgentConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "harbor")]
#[command(about = "Diagnostic console for the harbor offline caching agent")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show cache state: stores, the current namespace, and cached URLs.
    Inspect,
    /// Delete every cache store this agent created.
    Clear,
    /// Print manual uninstallation instructions per platform.
    UninstallHelp,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AgentConfig::load()?;
    let identity = config.identity();

    match args.command {
        Command::Inspect => inspect(&config, &identity).await,
        Command::Clear => clear(&config, &identity).await,
        Command::UninstallHelp => {
            println!("{UNINSTALL_HELP}");
            Ok(())
        }
    }
}

async fn inspect(config: &AgentConfig, identity: &CacheIdentity) -> Result<()> {
    tracing::debug!("opening cache database at {}", config.db_path.display());
    let db = CacheDb::open(&config.db_path).await?;
    println!("current namespace: {}", identity.namespace());

    let names = db.store_names().await?;
    if names.is_empty() {
        println!("no cache stores found");
        return Ok(());
    }

    for name in names {
        let count = db.entry_count(&name).await?;
        let marker = if name == identity.namespace() {
            " (current)"
        } else if identity.is_stale(&name) {
            " (stale)"
        } else {
            ""
        };
        println!("{name}{marker}: {count} entries");
        for url in db.keys(&name).await? {
            println!("  {url}");
        }
    }

    Ok(())
}

async fn clear(config: &AgentConfig, identity: &CacheIdentity) -> Result<()> {
    let db = CacheDb::open(&config.db_path).await?;
    let deleted = db.delete_stores_with_prefix(identity.base_name(), None).await?;
    println!("deleted {deleted} cache store(s); reload the app to reinstall the worker");
    Ok(())
}

const UNINSTALL_HELP: &str = "\
Manual uninstall instructions:

Chrome (desktop):
  1. Open the app window
  2. Click the menu button (three dots) in the top-right corner
  3. Choose \"Uninstall <app name>...\"
  4. Confirm in the dialog

Chrome (Android):
  1. Long-press the app icon
  2. Choose \"App info\"
  3. Tap \"Uninstall\"

Firefox:
  1. Open the app window
  2. Click the menu button (three bars) in the top-right corner
  3. Open the \"Install app\" submenu
  4. Click \"Remove <app name>\"

Safari (iOS):
  1. Long-press the app icon on the home screen
  2. Choose \"Delete App\"
  3. Tap \"Delete\"

Windows:
  1. Open Settings > Apps > Apps & features
  2. Find the app in the list
  3. Click \"Uninstall\" and confirm

macOS:
  1. Open Launchpad
  2. Long-press the app icon until it jiggles
  3. Click the \"x\" on the icon and confirm";
