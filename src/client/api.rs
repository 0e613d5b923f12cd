use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::response::ViewCountResponse;
use crate::store::ViewCounts;

/// Remote view count API as seen by the page
#[async_trait]
pub trait ViewsApi: Send + Sync {
    async fn get_views(&self, slug: &str) -> Result<u64>;

    async fn increment(&self, slug: &str) -> Result<u64>;

    async fn list(&self) -> Result<ViewCounts>;
}

/// [`ViewsApi`] over HTTP against a running pageviews server
#[derive(Debug, Clone)]
pub struct HttpViewsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpViewsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn views_url(&self, slug: &str) -> String {
        format!("{}/api/views/{}", self.base_url, slug)
    }

    pub fn list_url(&self) -> String {
        format!("{}/api/list-view-count", self.base_url)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Request(format!(
            "{} returned {}",
            response.url(),
            status
        )));
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl ViewsApi for HttpViewsApi {
    async fn get_views(&self, slug: &str) -> Result<u64> {
        let response = self.client.get(self.views_url(slug)).send().await?;
        let body: ViewCountResponse = decode(response).await?;
        Ok(body.views)
    }

    async fn increment(&self, slug: &str) -> Result<u64> {
        let response = self.client.post(self.views_url(slug)).send().await?;
        let body: ViewCountResponse = decode(response).await?;
        Ok(body.views)
    }

    async fn list(&self) -> Result<ViewCounts> {
        let response = self.client.get(self.list_url()).send().await?;
        decode(response).await
    }
}
