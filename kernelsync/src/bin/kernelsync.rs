use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kernelsync::{
    backend::StoreBackendBuilder,
    config::SyncConfig,
    cors::{cors_entries, update_cors},
    couchdb::CouchDbStore,
    enumerate::{EnumerateMode, enumerate},
    init::initialize,
    provision::provision_user,
    store::DocumentStore,
    verify::{ProbeDocument, verify_read_write},
};

#[derive(Parser)]
#[command(name = "kernelsync", version, about = "Verify and prepare the Kernel CouchDB sync store")]
struct Cli {
    /// TOML configuration file (defaults to ./kernelsync.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count documents in every collection and show a sample
    Check,
    /// Count documents in every collection and list their ids
    Verify,
    /// Enable CORS on the server node
    Cors,
    /// Write, read back and delete a probe document
    TestRw,
    /// Check connectivity, configure CORS and create the collection databases
    Init,
    /// Ensure a user's databases exist and are secured
    Provision {
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = SyncConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?
        .apply_env();

    let backend = CouchDbStore::builder(&config.url)
        .credentials(&config.username, &config.password)
        .timeout(config.timeout())
        .build()
        .await
        .context("failed to build CouchDB client")?;
    let store = DocumentStore::new(backend);

    match cli.command {
        Command::Check => {
            println!("Checking CouchDB data...");
            print!("{}", enumerate(&store, &config.collections, EnumerateMode::Sample).await);
        }
        Command::Verify => {
            println!("Verifying CouchDB data sync...");
            print!("{}", enumerate(&store, &config.collections, EnumerateMode::ListIds).await);
            println!("Verification complete.");
        }
        Command::Cors => {
            println!("Configuring CORS for CouchDB...");
            let entries = cors_entries("httpd", &config.cors.origins);
            print!("{}", update_cors(&store, &config.cors.default_node, &entries).await);
        }
        Command::TestRw => {
            let probe = ProbeDocument::at(Utc::now());
            print!("{}", verify_read_write(&store, &config.verify_collection, &probe).await);
        }
        Command::Init => {
            println!("Checking CouchDB databases...");
            let entries = cors_entries("chttpd", &config.cors.init_origins);
            print!("{}", initialize(&store, &config.collections, &entries).await);
        }
        Command::Provision { user } => {
            print!(
                "{}",
                provision_user(&store, &config.username, &user, &config.collections).await
            );
        }
    }

    store.shutdown().await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
