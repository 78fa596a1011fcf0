use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lector::services::GeminiClient;
use lector::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // LOG_FORMAT has to be known before the subscriber exists
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|format| format.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    init_tracing(json_logs);

    let config = Config::from_env()?;

    tracing::info!("Starting Lector PDF Text Service");
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);

    let client = GeminiClient::from_config(&config).context("Failed to build Gemini HTTP client")?;
    tracing::info!(
        model = %client.model(),
        timeout_secs = ?config.upstream_timeout_seconds,
        "Gemini client configured"
    );

    let addr = config.bind_address();
    let app = create_router(AppState::new(config, Arc::new(client)));

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lector=debug,tower_http=debug,axum::rejection=trace".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
