use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod cleanup;
mod config;
mod domain;
mod errors;
mod ports;
mod routes;
mod upstream;
mod usecase;

use cache::InMemoryCache;
use cleanup::CacheCleanupTask;
use config::Config;
use ports::CachePort;
use routes::{create_router, AppState};
use upstream::WeatherApiClient;
use usecase::GetWeatherUseCase;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "city_weather_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Wire up the retrieval pipeline
    let cache = Arc::new(InMemoryCache::new());
    let weather_client = Arc::new(WeatherApiClient::new(&config));
    let use_case = Arc::new(GetWeatherUseCase::new(
        weather_client,
        Some(Arc::clone(&cache) as Arc<dyn CachePort>),
        config.cache_ttl_secs,
    ));

    // Start the background expiry scanner
    let mut cleanup_task = CacheCleanupTask::new(
        Arc::clone(&cache),
        Duration::from_secs(config.cleanup_interval_secs),
    );
    cleanup_task.start();

    let config = Arc::new(config);

    // Create application state
    let state = AppState {
        config: Arc::clone(&config),
        use_case,
    };

    let app = create_router(state).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server starting on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the current sweep finish before exiting
    cleanup_task.stop().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
