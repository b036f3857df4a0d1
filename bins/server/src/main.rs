//! Madani API Server
//!
//! Main entry point for the blog's PDF attachment service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use madani_api::{AppState, create_router};
use madani_core::attachment::{
    AttachmentRepository, AttachmentService, MemoryAttachmentRepository,
};
use madani_core::storage::StorageConfig;
use madani_db::PgAttachmentRepository;
use madani_shared::{AppConfig, DeploymentEnvironment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "madani=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let storage = StorageConfig::load().context("Failed to load storage configuration")?;
    let environment = DeploymentEnvironment::detect();

    info!(
        uploads_dir = %storage.uploads_dir.display(),
        max_file_size = storage.max_file_size,
        inline_ceiling = storage.inline_ceiling,
        external = storage.external.as_ref().map_or("none", |p| p.name()),
        "Storage configured"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);

    if config.database.url.is_some() {
        // Connects lazily; a failed connect shows up in /api/health.
        let repo = PgAttachmentRepository::lazy(config.database.clone());
        run(&addr, storage, environment, Arc::new(repo)).await
    } else {
        warn!("No database URL configured; posts and overflow documents are kept in memory");
        run(
            &addr,
            storage,
            environment,
            Arc::new(MemoryAttachmentRepository::new()),
        )
        .await
    }
}

async fn run<R: AttachmentRepository + 'static>(
    addr: &str,
    storage: StorageConfig,
    environment: DeploymentEnvironment,
    repo: Arc<R>,
) -> anyhow::Result<()> {
    let service = AttachmentService::from_config(storage, environment, repo)
        .context("Failed to open attachment storage")?;

    // Create router
    let app = create_router(AppState::new(service));

    // Start server
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
