use tracing::{error, info};

use loft::{BlobStorage, Config, Database, SettingsRepository};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = loft::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        loft::logging::init_console_only(&config.logging.level);
    }

    info!("Loft - personal cloud drive");

    // Connect to the database (bounded retries with fixed backoff)
    let db = match Database::connect(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    // Ensure the site settings row exists
    let settings = async {
        let mut conn = db.acquire().await?;
        SettingsRepository::initialize(&mut conn).await?;
        SettingsRepository::get(&mut conn).await
    }
    .await;
    match settings {
        Ok(settings) if settings.site_url.is_empty() => {
            info!("Site URL is not configured yet; uploads and downloads are disabled until an admin sets it");
        }
        Ok(settings) => info!("Site base URL: {}", settings.site_url),
        Err(e) => {
            error!("Failed to initialize site settings: {e}");
            std::process::exit(1);
        }
    }

    // Prepare blob storage
    if let Err(e) = BlobStorage::new(&config.storage.path) {
        error!("Failed to prepare blob storage: {e}");
        std::process::exit(1);
    }

    info!(
        "Server configured on {}:{} (storage at {}, quota {} MB/user)",
        config.server.host, config.server.port, config.storage.path, config.quota.user_limit_mb
    );
}
