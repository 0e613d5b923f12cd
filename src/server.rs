use crate::config::Config;
use crate::error::Result;
use crate::handlers::{
    get_views, health_check, increment_views, list_view_count, missing_slug, readiness_check,
    AppState,
};
use crate::middleware::{logging_middleware, rate_limit_middleware};
use crate::rate_limiter::RateLimiter;
use crate::store::{MemoryStore, RedisStore, ViewStore};
use axum::routing::get;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the router. Each API route group gets its own rate limiter.
pub fn create_app(state: AppState) -> Router {
    let list_routes = Router::new()
        .route("/api/list-view-count", get(list_view_count))
        .route_layer(middleware::from_fn_with_state(
            state.list_limiter.clone(),
            rate_limit_middleware,
        ));

    let view_routes = Router::new()
        .route("/api/views/", get(missing_slug).post(missing_slug))
        .route("/api/views/:slug", get(get_views).post(increment_views))
        .route_layer(middleware::from_fn_with_state(
            state.views_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .merge(list_routes)
        .merge(view_routes)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn ViewStore> = if config.uses_redis() {
            Arc::new(RedisStore::connect(&config.redis_url, &config.redis_key_prefix).await?)
        } else {
            tracing::warn!("REDIS_URL not set, view counts are kept in memory only");
            Arc::new(MemoryStore::new())
        };

        let list_limiter = RateLimiter::from_config(&config);
        let views_limiter = RateLimiter::from_config(&config);
        list_limiter.spawn_cleanup(config.cleanup_interval());
        views_limiter.spawn_cleanup(config.cleanup_interval());

        let state = AppState::new(store, list_limiter, views_limiter);

        Ok(Self {
            app: create_app(state),
            bind_addr: config.bind_addr,
        })
    }

    pub async fn run(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        tracing::info!("pageviews server listening on {}", self.bind_addr);
        tracing::info!("Health check available at /health");
        tracing::info!("Readiness check available at /ready");

        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
