use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Parser, Clone)]
#[command(name = "pageviews")]
#[command(about = "View-count API for the blog")]
pub struct Config {
    /// Server bind address
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Redis connection URL, empty for the in-memory store
    #[arg(long, env = "REDIS_URL", default_value = "")]
    pub redis_url: String,

    /// Prefix applied to every Redis key
    #[arg(long, env = "REDIS_KEY_PREFIX", default_value = "pageviews:")]
    pub redis_key_prefix: String,

    /// Requests allowed per client within one window
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 60)]
    pub rate_limit_max_requests: u32,

    /// Rate limit window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 60)]
    pub rate_limit_window_secs: u64,

    /// Message returned with 429 responses
    #[arg(long, env = "RATE_LIMIT_MESSAGE", default_value = "Too many requests, please try again later.")]
    pub rate_limit_message: String,

    /// Rate limiter cleanup interval in seconds
    #[arg(long, env = "CLEANUP_INTERVAL_SECS", default_value_t = 300)]
    pub cleanup_interval_secs: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            redis_url: String::new(),
            redis_key_prefix: "pageviews:".to_string(),
            rate_limit_max_requests: 60,
            rate_limit_window_secs: 60,
            rate_limit_message: "Too many requests, please try again later.".to_string(),
            cleanup_interval_secs: 300,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from command line arguments and environment
    pub fn from_env() -> Result<Self> {
        let config = Config::try_parse().map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_limit_max_requests == 0 {
            return Err(Error::Config(
                "Rate limit max requests must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_window_secs == 0 {
            return Err(Error::Config(
                "Rate limit window must be greater than 0".to_string(),
            ));
        }

        if self.cleanup_interval_secs == 0 {
            return Err(Error::Config(
                "Cleanup interval must be greater than 0".to_string(),
            ));
        }

        if self.uses_redis()
            && !self.redis_url.starts_with("redis://")
            && !self.redis_url.starts_with("rediss://")
        {
            return Err(Error::Config(
                "Redis URL must start with 'redis://' or 'rediss://'".to_string(),
            ));
        }

        Ok(())
    }

    pub fn uses_redis(&self) -> bool {
        !self.redis_url.trim().is_empty()
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.uses_redis());
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = Config {
            rate_limit_max_requests: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redis_url_scheme_checked() {
        let config = Config {
            redis_url: "http://localhost:6379".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            redis_url: "redis://localhost:6379".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.uses_redis());
    }

    #[test]
    fn test_parse_from_args() {
        let config = Config::try_parse_from([
            "pageviews",
            "--rate-limit-max-requests",
            "10",
            "--bind-addr",
            "0.0.0.0:8080",
        ])
        .unwrap();
        assert_eq!(config.rate_limit_max_requests, 10);
        assert_eq!(config.bind_addr.port(), 8080);
    }
}
