mod config;
mod state;
mod routes;
mod translate;

use anyhow::Result;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, loaded_path) = Config::discover()?;

    let default_filter = if config.system_config.debug {
        "dholuo_translator=debug,tower_http=debug"
    } else {
        "dholuo_translator=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match &loaded_path {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    let app_state = AppState::new(&config)?;

    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let system_config = &config.system_config;
    let listener =
        tokio::net::TcpListener::bind((system_config.host.as_str(), system_config.port)).await?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
