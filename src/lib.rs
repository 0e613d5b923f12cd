pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod html;
pub mod middleware;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use handlers::AppState;
pub use html::escape_html;
pub use rate_limiter::RateLimiter;
pub use response::ViewCountResponse;
pub use server::create_app;
pub use store::{MemoryStore, RedisStore, ViewStore};
