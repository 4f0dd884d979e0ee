//! reelforge server binary: HTTP API + in-process worker pool.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_api::{create_router, ApiConfig, AppState};
use reel_api::routes::StaticRoots;
use reel_assets::{AssetCache, MarkRegistry, MockProvider, PexelsProvider, RetentionSweeper, StockProvider};
use reel_queue::JobStore;
use reel_worker::{
    synth_from_env, FfmpegSegmentRenderer, JobProcessor, OracleRouter, SceneProcessor,
    VisualTimelineBuilder, WorkerConfig, WorkerPool,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env().add_directive("reel=info".parse().unwrap()),
        )
        .init();

    info!("Starting reelforge");

    let api_config = ApiConfig::from_env();
    let worker_config = WorkerConfig::from_env();
    info!(
        host = %api_config.host,
        port = api_config.port,
        max_jobs = worker_config.max_concurrent_jobs,
        "Configuration loaded"
    );

    // Shared handles, composed once and owned here.
    let store = JobStore::new();
    let marks = match MarkRegistry::load(&worker_config.marks_file).await {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to load marked jobs: {}", e);
            std::process::exit(1);
        }
    };

    // Stock providers: Pexels when a key exists, mock always as the
    // offline floor.
    let mut providers: Vec<Box<dyn StockProvider>> = Vec::new();
    if let Some(pexels) = PexelsProvider::from_env() {
        info!("Pexels stock provider enabled");
        providers.push(Box::new(pexels));
    }
    providers.push(Box::new(MockProvider::default()));

    let visuals = Arc::new(VisualTimelineBuilder::new(
        AssetCache::new(),
        Arc::new(providers),
        worker_config.clips_dir.clone(),
        worker_config.placeholder_clip.clone(),
    ));

    let scenes = Arc::new(SceneProcessor {
        config: worker_config.clone(),
        synth: Arc::from(synth_from_env()),
        visuals,
        renderer: Arc::new(FfmpegSegmentRenderer::new(&worker_config)),
    });

    let processor = Arc::new(JobProcessor {
        store: store.clone(),
        oracle: Arc::new(OracleRouter::from_env(worker_config.oracle_min_interval)),
        scenes,
        max_script_attempts: worker_config.max_script_attempts,
    });

    // Worker pool: bounded concurrency over the FIFO.
    WorkerPool::new(store.clone(), processor, worker_config.max_concurrent_jobs).spawn();

    // Retention: sweep at startup and then daily, never touching
    // files of active jobs.
    let sweeper = RetentionSweeper::new(worker_config.sweep_dirs(), Arc::clone(&marks));
    let sweep_store = store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(reel_assets::retention::SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let active = sweep_store.active_ids().await;
            if let Err(e) = sweeper.sweep(&active).await {
                warn!("Retention sweep failed: {}", e);
            }
        }
    });

    let state = AppState::new(api_config.clone(), store, marks);
    let app = create_router(
        state,
        StaticRoots {
            assets: worker_config.clips_dir.parent().unwrap_or(std::path::Path::new("assets")),
            output: &worker_config.output_dir,
            cache: &worker_config.render_dir,
        },
    );

    let addr: SocketAddr = format!("{}:{}", api_config.host, api_config.port)
        .parse()
        .expect("Invalid bind address");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            error!("Port {} already in use", api_config.port);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
