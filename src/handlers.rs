use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::rate_limiter::RateLimiter;
use crate::response::{HealthResponse, ReadinessResponse, ViewCountResponse};
use crate::store::ViewStore;
use crate::validation::SlugParam;

/// Cache policy for the bulk listing
pub const LIST_CACHE_CONTROL: &str = "public, s-maxage=10, stale-while-revalidate=59";

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ViewStore>,
    pub list_limiter: RateLimiter,
    pub views_limiter: RateLimiter,
}

impl AppState {
    pub fn new(store: Arc<dyn ViewStore>, list_limiter: RateLimiter, views_limiter: RateLimiter) -> Self {
        Self {
            store,
            list_limiter,
            views_limiter,
        }
    }
}

/// Every slug with its count
pub async fn list_view_count(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let counts = state.store.all().await?;

    Ok((
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static(LIST_CACHE_CONTROL),
        )],
        Json(counts),
    ))
}

/// Validated slug from the path. Undecodable segments are reported as an
/// invalid slug rather than axum's plain-text rejection.
fn slug_from_path(params: std::result::Result<Path<SlugParam>, PathRejection>) -> Result<String> {
    match params {
        Ok(Path(params)) => params.into_valid(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "slug path rejected");
            Err(Error::InvalidSlug("Invalid slug".to_string()))
        }
    }
}

/// Current count for one slug
pub async fn get_views(
    State(state): State<AppState>,
    params: std::result::Result<Path<SlugParam>, PathRejection>,
) -> Result<Json<ViewCountResponse>> {
    let slug = slug_from_path(params)?;
    let views = state.store.get(&slug).await?;

    Ok(Json(ViewCountResponse::new(slug, views)))
}

/// Record one view for a slug and return the new count
pub async fn increment_views(
    State(state): State<AppState>,
    params: std::result::Result<Path<SlugParam>, PathRejection>,
) -> Result<Json<ViewCountResponse>> {
    let slug = slug_from_path(params)?;
    let views = state.store.increment(&slug).await?;

    tracing::debug!(slug = %slug, views, "view recorded");

    Ok(Json(ViewCountResponse::new(slug, views)))
}

/// `/api/views/` with the slug left off
pub async fn missing_slug() -> Error {
    Error::InvalidSlug("Slug cannot be empty".to_string())
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse::healthy(state.store.backend()))
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            false
        }
    };

    let tracked = state.list_limiter.tracked_clients() + state.views_limiter.tracked_clients();
    let status = if store_connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse::new(
            state.store.backend(),
            store_connected,
            tracked,
        )),
    )
}
