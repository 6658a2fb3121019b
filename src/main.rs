use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use asr_api::{
    create_router, AppState, Config, MemoryStore, Pipeline, RedisStore, SessionController,
    SessionStore, StorageBackend, StubPipeline,
};
use clap::Parser;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "asr-api", about = "Streaming speech recognition API")]
struct Args {
    /// Path to the configuration file, without extension
    #[arg(long, default_value = "config/asr-api")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Session timeout: {}s, max upload: {}MB",
        cfg.limits.session_timeout_seconds, cfg.limits.max_file_size_mb
    );

    let store: Arc<dyn SessionStore> = match cfg.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory session storage");
            Arc::new(MemoryStore::new(Duration::from_secs(
                cfg.limits.session_timeout_seconds,
            )))
        }
        StorageBackend::Redis => {
            info!("Using Redis session storage at {}", cfg.storage.redis_url);
            Arc::new(
                RedisStore::connect(
                    &cfg.storage.redis_url,
                    &cfg.storage.redis_key_prefix,
                    cfg.limits.session_timeout_seconds,
                )
                .await
                .context("Failed to initialize Redis storage")?,
            )
        }
    };

    let pipeline: Arc<dyn Pipeline> = match cfg.pipeline.backend.as_str() {
        "stub" => Arc::new(StubPipeline::new()),
        other => bail!("Unknown pipeline backend: {}", other),
    };
    info!("Decoder pipeline: {}", pipeline.name());

    let controller = Arc::new(SessionController::new(pipeline, store));
    let state = AppState::new(Arc::clone(&controller), Arc::new(cfg.clone()));
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.host, cfg.service.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let removed = controller.shutdown_cleanup().await;
    info!("Cleaned up {} active session(s)", removed);
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
