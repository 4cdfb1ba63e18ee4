//! Campus Lost & Found server
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults (port 4000, data under the user's local data dir)
//! campus-lostfound
//!
//! # Custom config file
//! campus-lostfound --config /path/to/config.toml
//!
//! # Custom port and storage directory
//! campus-lostfound --http-port 8080 --storage-dir /var/lib/lostfound
//!
//! # Throwaway database for demos
//! campus-lostfound --in-memory
//! ```
//!
//! Identity comes from gateway headers (`x-user-id`, `x-user-role`,
//! `x-user-name`, `x-user-email` by default).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use campus_lostfound::services::spawn_logging_listener;
use campus_lostfound::{Config, HeaderIdentityProvider, HttpServer, LostFoundDb, Services};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "campus-lostfound")]
#[command(about = "Campus lost-and-found backend")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage directory (database and default config)
    #[arg(long, env = "LOSTFOUND_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, env = "PORT")]
    http_port: Option<u16>,

    /// Bind address
    #[arg(long)]
    bind: Option<String>,

    /// Origin allowed by CORS (the SPA)
    #[arg(long, env = "CORS_ORIGIN")]
    cors_origin: Option<String>,

    /// Use an in-memory database; nothing survives a restart
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("campus_lostfound=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    // CLI overrides
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(origin) = args.cors_origin {
        config.cors_origin = origin;
    }
    config.validate().context("invalid configuration")?;

    info!(
        storage_dir = %config.storage_dir.display(),
        http_port = config.http_port,
        in_memory = args.in_memory,
        "Starting campus-lostfound"
    );

    let db = if args.in_memory {
        LostFoundDb::open_in_memory().context("failed to open in-memory database")?
    } else {
        tokio::fs::create_dir_all(&config.storage_dir)
            .await
            .with_context(|| format!("failed to create {}", config.storage_dir.display()))?;

        let config_path = config.config_path();
        if args.config.is_none() && !config_path.exists() {
            config.save(&config_path).context("failed to write default config")?;
            info!(path = %config_path.display(), "Created default config");
        }

        LostFoundDb::open(&config.db_path()).context("failed to open database")?
    };
    let db = Arc::new(db);

    if let Ok(stats) = db.stats() {
        info!(
            items = stats.item_count,
            claims = stats.claim_count,
            returns = stats.return_count,
            "Database ready"
        );
    }

    let services = Arc::new(Services::new(db.clone(), &config));
    let listener = spawn_logging_listener(services.events.clone());

    let identity = Arc::new(HeaderIdentityProvider::new(config.identity.clone()));
    let http_server = Arc::new(
        HttpServer::new(services, identity, &config).context("failed to build HTTP server")?,
    );

    info!("Press Ctrl+C to stop.");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    tokio::select! {
        result = http_server.run() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
            }
        }
        _ = shutdown => {}
    }

    listener.abort();

    if let Ok(stats) = db.stats() {
        info!(
            items = stats.item_count,
            claims = stats.claim_count,
            returns = stats.return_count,
            "Final store stats"
        );
    }

    Ok(())
}
