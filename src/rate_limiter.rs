use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::Config;

/// Per-client request counter for the current window.
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub window_start: Instant,
    pub count: u32,
}

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// In-memory fixed-window rate limiter keyed by client.
///
/// State lives in this process only; several instances behind a load
/// balancer each enforce the limit on their own.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

struct RateLimiterInner {
    max_requests: u32,
    window: Duration,
    message: String,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RateLimiterInner {
                max_requests,
                window,
                message: message.into(),
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rate_limit_max_requests,
            config.rate_limit_window(),
            config.rate_limit_message.clone(),
        )
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Count a request from `key` and decide whether it may proceed
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let limit = self.inner.max_requests;
        let window = self.inner.window;

        let mut entries = match self.inner.entries.lock() {
            Ok(entries) => entries,
            Err(_) => {
                tracing::warn!(client = %key, "rate limiter state poisoned, treating request as new client");
                return RateLimitDecision {
                    allowed: true,
                    limit,
                    remaining: limit.saturating_sub(1),
                    reset_after: window,
                };
            }
        };

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            window_start: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed >= window {
            entry.window_start = now;
            entry.count = 0;
        }

        let reset_after = window.saturating_sub(now.saturating_duration_since(entry.window_start));

        if entry.count < limit {
            entry.count += 1;
            RateLimitDecision {
                allowed: true,
                limit,
                remaining: limit - entry.count,
                reset_after,
            }
        } else {
            RateLimitDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_after,
            }
        }
    }

    /// Forget the window for a key
    pub fn reset(&self, key: &str) {
        if let Ok(mut entries) = self.inner.entries.lock() {
            entries.remove(key);
        }
    }

    /// Drop entries whose window has elapsed, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub fn cleanup_expired_at(&self, now: Instant) -> usize {
        let window = self.inner.window;
        let Ok(mut entries) = self.inner.entries.lock() else {
            return 0;
        };

        let initial_count = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.window_start) < window);
        initial_count - entries.len()
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.inner
            .entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Spawn a background task that periodically purges expired entries
    pub fn spawn_cleanup(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.cleanup_expired();
                if removed > 0 {
                    tracing::debug!(removed, "purged expired rate limit entries");
                }
            }
        })
    }
}
