use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use box_box_box::aggregator::Aggregator;
use box_box_box::config::{Config, DEFAULT_FETCH_TIMEOUT};
use box_box_box::fetcher::Fetcher;
use box_box_box::registry::Registry;
use box_box_box::routes::{self, AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "box_box_box=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration, falling back to the built-in sources
    let config_path = std::env::var("FEEDS_CONFIG").unwrap_or_else(|_| "feeds.toml".to_string());
    let (registry, fetch_timeout) = if Path::new(&config_path).exists() {
        let config = Config::load(&config_path)?;
        (Registry::from_config(&config)?, config.fetch_timeout)
    } else {
        warn!("{} not found, using built-in feeds", config_path);
        (Registry::builtin(), DEFAULT_FETCH_TIMEOUT)
    };
    info!("Loaded {} feeds", registry.len());

    let fetcher = Fetcher::new(Duration::from_secs(fetch_timeout))?;
    let state = Arc::new(AppState {
        aggregator: Arc::new(Aggregator::new(registry, fetcher)),
    });

    let app = routes::router(state);

    // Start server
    let port: u16 = match std::env::var("PORT") {
        Ok(port) => port.parse()?,
        Err(_) => 5000,
    };
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server starting on http://localhost:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
