use std::sync::Arc;

use tracing::{error, info};

use quill::web::{AppState, WebServer};
use quill::{Config, Database, LogNotifier, SessionKeys};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = quill::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        quill::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Quill stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> quill::Result<()> {
    config.validate()?;

    info!("Quill - blogging backend");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = Database::open(&config.database.path).await?;
    info!("Database opened at {}", config.database.path);

    let store = quill::storage::from_config(&config.storage).await?;
    let keys = SessionKeys::with_expiry(&config.web.jwt_secret, config.web.session_expiry_secs);

    let state = AppState::new(Arc::new(db), store, Arc::new(keys))
        .with_notifier(Arc::new(LogNotifier))
        .with_admin(config.admin.clone())
        .with_secure_cookie(config.web.secure_cookie)
        .with_max_upload_size_mb(config.storage.max_upload_size_mb);

    WebServer::new(&config, state)?.run().await
}
