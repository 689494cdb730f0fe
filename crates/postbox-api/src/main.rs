mod config;
mod error;
mod routes;

use std::sync::Arc;

use config::AppConfig;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("postbox_api=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(?config, "Starting postbox-api");

    let state = AppState::from_config(config);
    let bind_addr = state.config.bind_addr.clone();
    let store_path = state.config.store_path.clone();
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        %bind_addr,
        store_path = %store_path.display(),
        "postbox-api listening"
    );
    axum::serve(listener, router).await?;
    Ok(())
}
