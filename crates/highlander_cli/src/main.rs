//! Operator tooling for the highlander schema.
//!
//! # Commands
//!
//! - `upgrade` - Create missing tables and apply pending migrations
//! - `drop` - Drop every managed table
//! - `version` - Show binary and schema versions

use clap::{Parser, Subcommand};
use highlander_core::config::{HighlanderConfig, StoreConfig, StoreLocation};
use highlander_core::db::migrations::latest_version;
use highlander_core::logging::init_from_config;
use highlander_core::{core_version, Store};
use log::info;
use std::error::Error;
use std::path::PathBuf;

/// Highlander database management.
#[derive(Parser)]
#[command(name = "highlander-db-manage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// SQLite database file; overrides the configured store location
    #[arg(global = true, short, long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables and apply pending migrations
    Upgrade,

    /// Drop every managed table
    Drop {
        /// Confirm the irreversible drop
        #[arg(long)]
        yes: bool,
    },

    /// Show binary and schema versions
    Version,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_from_config(&config.logging)?;

    match cli.command {
        Commands::Upgrade => {
            let store = Store::open(config.store)?;
            let version = store.setup_schema()?;
            info!("event=cli_upgrade module=cli status=ok version={version}");
            println!("schema upgraded to version {version}");
        }
        Commands::Drop { yes } => {
            if !yes {
                return Err("refusing to drop the schema without --yes".into());
            }
            let store = Store::open(config.store)?;
            store.drop_schema()?;
            info!("event=cli_drop module=cli status=ok");
            println!("schema dropped");
        }
        Commands::Version => {
            println!("highlander-db-manage {}", core_version());
            println!("latest schema version {}", latest_version());
            let store = Store::open(config.store)?;
            println!("database schema version {}", store.schema_version()?);
        }
    }

    Ok(())
}

/// Loads the configuration and applies `--db`.
///
/// Refuses in-memory stores: nothing they hold outlives the process.
fn resolve_config(cli: &Cli) -> Result<HighlanderConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => HighlanderConfig::load(path)?,
        None => HighlanderConfig::default(),
    };
    if let Some(path) = &cli.db {
        config.store = StoreConfig {
            location: StoreConfig::file(path).location,
            ..config.store
        };
    }
    if config.store.location == StoreLocation::Memory {
        return Err(
            "no database file given; pass --db <path> or set store.location to a file in --config"
                .into(),
        );
    }
    config.store.validate()?;
    Ok(config)
}
