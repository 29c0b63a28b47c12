use std::net::SocketAddr;
use std::sync::Arc;

use pixsynth_core::ports::{BlobStore, CharacterRepository};
use pixsynth_db::{CharacterRepo, MemoryCharacterRepo};
use pixsynth_gateway::{LlamaApi, LlamaConfig, PixelLabApi, PixelLabConfig};
use pixsynth_pipeline::{GenerationContext, GenerationService, PipelineConfig, TokioSleeper};
use pixsynth_storage::{LocalBlobStore, StorageConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixsynth_api::config::ServerConfig;
use pixsynth_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pixsynth_api=debug,pixsynth_pipeline=debug,pixsynth_gateway=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    let storage = StorageConfig::from_env();
    let pixellab = PixelLabConfig::from_env();
    let llama = LlamaConfig::from_env();
    if pixellab.api_key.is_none() {
        tracing::warn!("PIXELLAB_KEY is not set, image generation requests will fail");
    }
    if llama.token.is_none() {
        tracing::warn!("HF_TOKEN is not set, characters will be generated without stories");
    }

    // --- Persistence ---
    let (repo, pool) = match &config.database_url {
        Some(database_url) => {
            let pool = pixsynth_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            pixsynth_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            pixsynth_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let repo: Arc<dyn CharacterRepository> = Arc::new(CharacterRepo::new(pool.clone()));
            (repo, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using in-memory persistence");
            let repo: Arc<dyn CharacterRepository> = Arc::new(MemoryCharacterRepo::new());
            (repo, None)
        }
    };

    tokio::fs::create_dir_all(&storage.root)
        .await
        .expect("Failed to create storage root");
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(storage.root.clone()));
    tracing::info!(root = %storage.root.display(), "Blob storage ready");

    // --- Generation service ---
    let ctx = GenerationContext {
        images: Arc::new(PixelLabApi::new(pixellab)),
        text: Arc::new(LlamaApi::new(llama)),
        repo,
        blobs,
        sleeper: Arc::new(TokioSleeper),
        config: PipelineConfig::from_env(),
    };

    let state = AppState {
        service: GenerationService::new(ctx),
        storage: Arc::new(storage),
        config: Arc::new(config.clone()),
        pool,
    };
    let app = pixsynth_api::build_app(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
