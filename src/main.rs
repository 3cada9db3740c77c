use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nmt_server::api::{create_router, AppState};
use nmt_server::common::config::Config;
use nmt_server::device::resolve_device;
use nmt_server::lang::LanguageDetector;
use nmt_server::pipelines::{
    preload_models, spawn_maintainer, ModelDiscovery, PipelineCache, PressureThresholds,
    ProcMeminfoProbe, TranslateGate, Translator,
};
use nmt_server::runtime::{HttpRuntime, InferenceRuntime};

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(Config::from_env());
    init_tracing(&config);

    let runtime: Arc<dyn InferenceRuntime> = Arc::new(HttpRuntime::new(&config.runtime_url));

    let gpu_available = match runtime.capabilities().await {
        Ok(capabilities) => capabilities.gpu_available,
        Err(error) => {
            warn!("runtime capability handshake failed ({error}), assuming CPU");
            false
        }
    };
    let setup = resolve_device(&config, gpu_available);

    let cache = Arc::new(PipelineCache::new(
        config.max_cached_models,
        setup.device,
        Arc::clone(&runtime),
        Arc::new(ProcMeminfoProbe),
        PressureThresholds {
            ram_critical: config.memory_critical_threshold,
            gpu_critical: config.gpu_memory_critical_threshold,
        },
    ));
    let gate = Arc::new(TranslateGate::new(&config, setup.max_inflight));
    let discovery = Arc::new(ModelDiscovery::new(config.discovery_ttl));
    let detector = Arc::new(LanguageDetector::new(&config));
    let translator = Arc::new(Translator::new(
        Arc::clone(&config),
        Arc::clone(&cache),
        Arc::clone(&gate),
        Arc::clone(&discovery),
        Arc::clone(&detector),
        Arc::clone(&runtime),
    ));

    if !config.preload_models.is_empty() {
        info!("preloading models: {}", config.preload_models);
        preload_models(&config, &cache).await;
    }

    let shutdown_token = CancellationToken::new();
    let maintainer = spawn_maintainer(
        Arc::clone(&config),
        Arc::clone(&cache),
        Arc::clone(&runtime),
        shutdown_token.clone(),
    );

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        translator,
        gate,
        cache: Arc::clone(&cache),
        discovery,
        detector,
        device: setup.device,
    });
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("translation server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Ordered teardown: the server has stopped accepting and drained
    // inflight requests; now stop maintenance and release device memory.
    info!("shutting down");
    shutdown_token.cancel();
    if tokio::time::timeout(config.graceful_timeout, maintainer)
        .await
        .is_err()
    {
        warn!("maintainer did not stop within the grace period");
    }
    cache.purge_all().await;
    info!("translation server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
