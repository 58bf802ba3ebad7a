//! Tessera admin CLI: issue upload tickets, purge expired ones, hash files.
//!
//! `issue` and `purge` connect to DATABASE_URL (read from the environment or `.env`).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tessera_cli::{digest_file, init_tracing, print_json, ticket_for_file};
use tessera_db::{PostgresTicketStore, TicketStore};

#[derive(Parser)]
#[command(name = "tessera-admin", about = "Tessera upload ticket administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a ticket authorizing upload of a local file's exact bytes
    Issue {
        /// File whose size and MD5 the ticket will require
        file: PathBuf,
        /// Destination path, relative to the storage root
        #[arg(long)]
        target: String,
        /// Content type the upload must declare
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
        /// Ticket id (random UUID when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Seconds until the ticket expires
        #[arg(long, default_value = "3600")]
        ttl_secs: i64,
    },
    /// Delete all expired tickets once
    Purge,
    /// Print a file's MD5 as base64 and hex
    Digest {
        /// File to hash
        file: PathBuf,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .context("Failed to connect to database")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Issue {
            file,
            target,
            content_type,
            id,
            ttl_secs,
        } => {
            if ttl_secs <= 0 {
                anyhow::bail!("--ttl-secs must be positive");
            }
            let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let new_ticket = ticket_for_file(
                id,
                &file,
                target,
                content_type,
                chrono::Duration::seconds(ttl_secs),
            )
            .await?;

            let store = PostgresTicketStore::new(connect().await?);
            let ticket = store.create(new_ticket).await?;
            tracing::info!(ticket_id = %ticket.id, target_path = %ticket.target_path, "Ticket issued");
            print_json(&ticket)?;
        }
        Commands::Purge => {
            let store = PostgresTicketStore::new(connect().await?);
            let purged = store.purge_expired(chrono::Utc::now()).await?;
            print_json(&serde_json::json!({ "purged": purged }))?;
        }
        Commands::Digest { file } => {
            let result = digest_file(&file).await?;
            print_json(&serde_json::json!({
                "file": file.display().to_string(),
                "size": result.size,
                "base64": result.digest.to_base64(),
                "hex": result.digest.to_hex(),
            }))?;
        }
    }

    Ok(())
}
