//! HTTP server: shared state, router assembly, and lifecycle.

pub mod error;
pub mod routes;
pub mod streaming;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::artifacts::{ArtifactExtractor, ArtifactStore};
use crate::browse::DirectoryLister;
use crate::config::Config;
use crate::metadata::MetadataCache;
use crate::paths::PathGuard;
use crate::probe::MediaProber;

/// Shared application state, cheap to clone into handlers.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub guard: Arc<PathGuard>,
    pub metadata: Arc<MetadataCache>,
    pub lister: Arc<DirectoryLister>,
    pub artifacts: Arc<ArtifactStore>,
}

impl AppContext {
    pub fn new(
        config: Config,
        prober: Arc<dyn MediaProber>,
        extractor: Arc<dyn ArtifactExtractor>,
    ) -> Self {
        let guard = Arc::new(PathGuard::new(&config.root));
        let metadata = Arc::new(MetadataCache::new(prober));
        let lister = Arc::new(DirectoryLister::new(
            Arc::clone(&guard),
            Arc::clone(&metadata),
        ));
        let artifacts = Arc::new(ArtifactStore::new(
            config.thumbnails_dir(),
            config.subtitles_dir(),
            extractor,
        ));
        Self {
            config: Arc::new(config),
            guard,
            metadata,
            lister,
            artifacts,
        }
    }
}

/// Assemble the full router: API routes, static mounts, middleware.
pub fn create_router(ctx: AppContext) -> Router {
    let thumbnails = ServeDir::new(ctx.config.thumbnails_dir());
    let subtitles = ServeDir::new(ctx.config.subtitles_dir());
    let static_assets = ServeDir::new(&ctx.config.static_dir);

    Router::new()
        .route("/", get(routes::index))
        .route("/api/browse", get(routes::browse_json))
        .route("/api/browse/html", get(routes::browse_html))
        .route("/api/video", get(routes::video_info))
        // axum's `get` also matches HEAD; the handler inspects the method
        // to skip the body.
        .route("/api/video/stream", get(routes::video_stream))
        .route("/api/video/thumbnail", get(routes::video_thumbnail))
        .route("/api/video/subtitle", get(routes::video_subtitle))
        .nest_service("/thumbnails", thumbnails)
        .nest_service("/subtitles", subtitles)
        .nest_service("/static", static_assets)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Bind and run the server until shutdown is requested.
pub async fn start(
    config: Config,
    prober: Arc<dyn MediaProber>,
    extractor: Arc<dyn ArtifactExtractor>,
) -> anyhow::Result<()> {
    config.ensure_directories()?;

    let addr = format!("{}:{}", config.host, config.port);
    let ctx = AppContext::new(config, prober, extractor);

    tracing::info!(
        addr = %addr,
        root = %ctx.config.root.display(),
        data = %ctx.config.data_dir.display(),
        "starting server"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, create_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .unwrap_or_else(|e| tracing::error!(error = %e, "failed to install ctrl-c handler"));
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
