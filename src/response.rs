use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Count for one slug, returned by the read and increment endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCountResponse {
    pub slug: String,
    pub views: u64,
}

impl ViewCountResponse {
    pub fn new(slug: impl Into<String>, views: u64) -> Self {
        Self {
            slug: slug.into(),
            views,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub store: String,
}

impl HealthResponse {
    pub fn healthy(store: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: unix_now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: store.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub store: String,
    pub store_connected: bool,
    pub rate_limited_clients: usize,
}

impl ReadinessResponse {
    pub fn new(store: &str, store_connected: bool, rate_limited_clients: usize) -> Self {
        Self {
            status: if store_connected { "ready" } else { "not_ready" }.to_string(),
            store: store.to_string(),
            store_connected,
            rate_limited_clients,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
