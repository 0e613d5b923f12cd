//! Page-side view counter: API client, shared query cache and the counter
//! widget itself.

pub mod api;
pub mod cache;
pub mod counter;

pub use api::{HttpViewsApi, ViewsApi};
pub use cache::{QueryCache, DEFAULT_STALE_TIME};
pub use counter::{format_count, prefetch_all, CounterState, ViewCounter};
