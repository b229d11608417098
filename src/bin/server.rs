//! Smokelog server — upload smoke-test logs and view derived reports.
//!
//! Usage:
//!   SMOKELOG_DB=/srv/projects.db SMOKELOG_BIND=0.0.0.0:8081 smokelog-server
//!
//! Or with args:
//!   smokelog-server --db ./projects.db --uploads ./uploads --bind 0.0.0.0:8081

use clap::Parser;
use smokelog_lib::db::Database;
use smokelog_lib::http_server::{self, AppState};
use smokelog_lib::settings::Settings;
use smokelog_lib::storage::ArtifactStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "smokelog-server", version, about = "Smoke-test log upload and report server")]
struct Args {
    /// JSON settings file; flags below override its values
    #[arg(long, env = "SMOKELOG_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, env = "SMOKELOG_DB")]
    db: Option<PathBuf>,

    /// Bind address
    #[arg(long, env = "SMOKELOG_BIND")]
    bind: Option<String>,

    /// Directory uploaded logs are stored in
    #[arg(long, env = "SMOKELOG_UPLOADS")]
    uploads: Option<PathBuf>,

    /// Maximum request body size for uploads, in bytes
    #[arg(long)]
    max_upload_bytes: Option<usize>,
}

impl Args {
    fn into_settings(self) -> Result<Settings, String> {
        let mut settings = Settings::load_or_default(self.config.as_deref())?;
        if let Some(db) = self.db {
            settings.db_path = db;
        }
        if let Some(bind) = self.bind {
            settings.bind = bind;
        }
        if let Some(uploads) = self.uploads {
            settings.upload_dir = uploads;
        }
        if let Some(max) = self.max_upload_bytes {
            settings.max_upload_bytes = max;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let settings = match Args::parse().into_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("[Server] {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("[Server] Database: {}", settings.db_path.display());
    tracing::info!("[Server] Uploads: {}", settings.upload_dir.display());

    let db = match Database::new(&settings.db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!("[Server] Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let store = match ArtifactStore::new(&settings.upload_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("[Server] Failed to prepare upload directory: {}", e);
            std::process::exit(1);
        }
    };

    let app = http_server::router(AppState::new(db, store), settings.max_upload_bytes);

    let listener = match tokio::net::TcpListener::bind(&settings.bind).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("[Server] Failed to bind to {}: {}", settings.bind, e);
            std::process::exit(1);
        }
    };

    tracing::info!("[Server] Listening on {}", settings.bind);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("[Server] Server error: {}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("[Server] Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[Server] Shutting down");
}
