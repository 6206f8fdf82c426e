//! Card Resolver - card identity resolution and cache service
//!
//! Serves card lookups over HTTP, resolving cache misses against YGOPRODeck
//! and persisting results (records, prices, images) to SQLite off the
//! request path.

use card_resolver::{persist, provider::YGOPRODECK_API_URL, web, CardResolver, ProviderClient};
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Card resolution service - resolves card names/IDs and caches results
#[derive(Parser, Debug)]
#[command(name = "card_resolver")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Port for the HTTP API
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Public base URL for this service (used in returned image links)
    #[arg(long)]
    public_url: Option<String>,

    /// Card catalog provider endpoint
    #[arg(long, default_value = YGOPRODECK_API_URL)]
    provider_url: String,

    /// Provider connect timeout in seconds
    #[arg(long, default_value_t = 5)]
    connect_timeout_secs: u64,

    /// Provider request timeout in seconds (the provider can be slow)
    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    /// Maximum concurrent background persistence tasks
    #[arg(long, default_value_t = 4)]
    persist_workers: usize,

    /// Pending persistence job limit (jobs beyond this are dropped)
    #[arg(long, default_value_t = 64)]
    persist_queue: usize,
}

/// Returns the default database path: ~/.local/share/card_resolver/cards.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("card_resolver")
        .join("cards.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);

    log::info!("Starting card_resolver...");
    log::info!("Database path: {}", db_path.display());
    log::info!("Provider endpoint: {}", args.provider_url);

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                std::process::exit(1);
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    // Open database connection
    let conn = match Connection::open(&db_path) {
        Ok(conn) => {
            log::info!("Opened database: {}", db_path.display());
            conn
        }
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database schema
    if let Err(e) = card_resolver::database::init_schema(&conn) {
        log::error!("Failed to initialize database schema: {}", e);
        std::process::exit(1);
    }

    // Wrap connection in Arc<Mutex> for thread-safe sharing
    let db = Arc::new(Mutex::new(conn));

    // Provider client with bounded timeouts
    let provider = match ProviderClient::new(
        &args.provider_url,
        Duration::from_secs(args.connect_timeout_secs),
        Duration::from_secs(args.request_timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build provider client: {}", e);
            std::process::exit(1);
        }
    };

    // Background persistence: bounded queue, capped concurrency
    let queue = persist::spawn(Arc::clone(&db), args.persist_queue, args.persist_workers);

    let resolver = Arc::new(CardResolver::new(Arc::clone(&db), provider, queue));

    let public_url = args
        .public_url
        .unwrap_or_else(|| format!("http://localhost:{}", args.port));

    if let Err(e) = web::serve(resolver, db, public_url, args.port).await {
        log::error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
