use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showcase_web::config::Config;
use showcase_web::services::BackendClient;
use showcase_web::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showcase_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Configuration loaded successfully");

    let backend = BackendClient::new(&config.backend)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { config, backend };

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
