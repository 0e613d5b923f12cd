//! View count persistence.
//!
//! Every backend keeps one counter per slug. Increments are upserts that
//! must be atomic inside the backend: concurrent increments for the same
//! slug never lose an update.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Snapshot of every known slug and its count
pub type ViewCounts = BTreeMap<String, u64>;

#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Current count for a slug, 0 when the slug has never been counted
    async fn get(&self, slug: &str) -> Result<u64>;

    /// Add one view to a slug, creating the counter if needed, and return
    /// the new count
    async fn increment(&self, slug: &str) -> Result<u64>;

    /// Every counter the store knows about
    async fn all(&self) -> Result<ViewCounts>;

    /// Check the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}
