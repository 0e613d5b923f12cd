use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ViewCounts, ViewStore};
use crate::error::Result;

/// Process-local store used when no Redis URL is configured
#[derive(Debug, Default)]
pub struct MemoryStore {
    counts: RwLock<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing counts
    pub fn with_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            counts: RwLock::new(
                counts
                    .into_iter()
                    .map(|(slug, views)| (slug.into(), views))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl ViewStore for MemoryStore {
    async fn get(&self, slug: &str) -> Result<u64> {
        let counts = self.counts.read().await;
        Ok(counts.get(slug).copied().unwrap_or(0))
    }

    async fn increment(&self, slug: &str) -> Result<u64> {
        let mut counts = self.counts.write().await;
        let views = counts.entry(slug.to_string()).or_insert(0);
        *views = views.saturating_add(1);
        Ok(*views)
    }

    async fn all(&self) -> Result<ViewCounts> {
        let counts = self.counts.read().await;
        Ok(counts
            .iter()
            .map(|(slug, views)| (slug.clone(), *views))
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
