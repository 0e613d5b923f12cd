use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;

use super::{ViewCounts, ViewStore};
use crate::error::{Error, Result};

/// Redis-backed store. All counters live in a single hash whose fields are
/// slugs, so an increment is one `HINCRBY`.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    key: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, key_prefix: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| Error::Store(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Store(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            connection,
            key: views_key(key_prefix),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

fn views_key(prefix: &str) -> String {
    format!("{}views", prefix)
}

#[async_trait]
impl ViewStore for RedisStore {
    async fn get(&self, slug: &str) -> Result<u64> {
        let mut conn = self.connection.clone();
        let views: Option<u64> = redis::cmd("HGET")
            .arg(&self.key)
            .arg(slug)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("HGET failed: {}", e)))?;

        Ok(views.unwrap_or(0))
    }

    async fn increment(&self, slug: &str) -> Result<u64> {
        let mut conn = self.connection.clone();
        redis::cmd("HINCRBY")
            .arg(&self.key)
            .arg(slug)
            .arg(1)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("HINCRBY failed: {}", e)))
    }

    async fn all(&self) -> Result<ViewCounts> {
        let mut conn = self.connection.clone();
        redis::cmd("HGETALL")
            .arg(&self.key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("HGETALL failed: {}", e)))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Ping failed: {}", e)))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_key_uses_prefix() {
        assert_eq!(views_key("pageviews:"), "pageviews:views");
        assert_eq!(views_key(""), "views");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let result = RedisStore::connect("not-a-url", "pageviews:").await;
        assert!(matches!(result, Err(Error::Store(_))));
    }
}
