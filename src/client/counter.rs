use std::sync::Arc;

use super::api::ViewsApi;
use super::cache::QueryCache;
use crate::error::Result;
use crate::html::escape_html;
use crate::store::ViewCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterState {
    Idle,
    Loading,
    Success(u64),
    Error,
}

/// View count widget for one post.
///
/// Counts are decorative, so failures never surface: the counter simply
/// renders nothing.
pub struct ViewCounter {
    slug: String,
    should_increment: bool,
    api: Arc<dyn ViewsApi>,
    cache: QueryCache,
    state: CounterState,
    last_known: Option<u64>,
    increment_fired: bool,
}

impl ViewCounter {
    pub fn new(
        slug: impl Into<String>,
        api: Arc<dyn ViewsApi>,
        cache: QueryCache,
    ) -> Self {
        Self {
            slug: slug.into(),
            should_increment: false,
            api,
            cache,
            state: CounterState::Idle,
            last_known: None,
            increment_fired: false,
        }
    }

    /// Record a view the first time this counter mounts
    pub fn increment_on_mount(mut self) -> Self {
        self.should_increment = true;
        self
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn state(&self) -> CounterState {
        self.state
    }

    /// Load the count, recording a view first if requested.
    ///
    /// The increment fires at most once per counter no matter how often it
    /// is mounted.
    pub async fn mount(&mut self) {
        self.state = CounterState::Loading;
        if self.last_known.is_none() {
            self.last_known = self.cache.peek(&self.slug);
        }

        if self.should_increment && !self.increment_fired {
            self.increment_fired = true;
            match self.api.increment(&self.slug).await {
                Ok(views) => self.cache.set(&self.slug, views),
                Err(e) => tracing::debug!(slug = %self.slug, error = %e, "view increment failed"),
            }
        }

        self.load().await;
    }

    /// Drop the cached count and load it again, showing the previous count
    /// meanwhile
    pub async fn refresh(&mut self) {
        self.cache.invalidate(&self.slug);
        self.state = CounterState::Loading;
        self.load().await;
    }

    async fn load(&mut self) {
        let api = self.api.clone();
        let slug = self.slug.clone();
        let result = self
            .cache
            .fetch(&self.slug, || async move { api.get_views(&slug).await })
            .await;

        self.state = match result {
            Ok(views) => {
                self.last_known = Some(views);
                CounterState::Success(views)
            }
            Err(e) => {
                tracing::debug!(slug = %self.slug, error = %e, "view count unavailable");
                CounterState::Error
            }
        };
    }

    /// Count to display, if any
    pub fn render(&self) -> Option<String> {
        match self.state {
            CounterState::Success(views) => Some(format_count(views)),
            CounterState::Loading => self.last_known.map(format_count),
            CounterState::Idle | CounterState::Error => None,
        }
    }

    pub fn render_html(&self) -> Option<String> {
        self.render().map(|count| {
            format!(
                "<span class=\"view-count\" data-slug=\"{}\">{} views</span>",
                escape_html(&self.slug),
                count
            )
        })
    }
}

/// Fetch every count once for a listing page and seed `cache` with them, so
/// counters mounted afterwards render without their own request
pub async fn prefetch_all(api: &dyn ViewsApi, cache: &QueryCache) -> Result<ViewCounts> {
    let counts = api.list().await?;
    cache.prime(&counts);
    Ok(counts)
}

/// Format with comma thousands separators
pub fn format_count(views: u64) -> String {
    let digits = views.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(c);
    }

    formatted
}
