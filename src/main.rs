use product_copywriter::{create_router, AppState, Config, GeminiClient, MemoryCache, PipelineController};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    if config.is_demo() {
        tracing::warn!("Gemini demo key in use, generating placeholder copy without calling the API");
    } else {
        tracing::info!("Gemini API key configured");
    }

    let gemini = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_api_base.clone(), config.gemini_model.clone());
    let pipeline = PipelineController::new(Arc::new(gemini), Arc::new(MemoryCache::new()), config.pipeline_config());
    let app = create_router(AppState { pipeline: Arc::new(pipeline) });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, model = %config.gemini_model, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
