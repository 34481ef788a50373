use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use temporal_core::{AnalysisService, ConfigValues, CoreConfig, DEFAULT_REST_ADDR};

/// Main entry point for the temporal analysis service
///
/// Loads `.env`, resolves the completion backend configuration once and serves the REST API.
///
/// # Environment Variables
/// - `TEMPORAL_REST_ADDR`: REST server address (default: "0.0.0.0:5001")
/// - `LLM_API_KEY` (or `OPENAI_API_KEY`): credential for the completion backend
/// - `LLM_ENDPOINT`, `LLM_MODEL`, `LLM_LIGHT_MODEL`, `LLM_TIMEOUT_SECS`: backend selection
/// - `TEMPORAL_TRANSCRIPT_DIR`: if set, every prompt and reply is written there
///
/// # Errors
/// Returns an error if the configuration is invalid, the address cannot be bound, or the server
/// fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("temporal=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_values(ConfigValues::from_env())?;
    if cfg.api_key().is_none() {
        tracing::warn!("no LLM_API_KEY or OPENAI_API_KEY set; requests are sent unauthenticated");
    }
    tracing::info!("completion backend: {:?}", cfg);

    let service = AnalysisService::from_config(&cfg)?;
    let app = api_rest::router(AppState::new(service));

    let rest_addr =
        std::env::var("TEMPORAL_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    tracing::info!("++ Starting temporal analysis REST API on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Temporal analysis REST API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
