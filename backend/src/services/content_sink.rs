use crate::error::{UpstreamError, UpstreamResult};
use crate::models::ContentVideo;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Downstream store for curated videos.
#[async_trait]
pub trait ContentSink: Send + Sync {
    /// Creates or updates one video.
    async fn publish(&self, video: &ContentVideo) -> UpstreamResult<()>;

    /// Drops previously published videos for a tag before a fresh batch.
    async fn clear_tag(&self, tag: &str) -> UpstreamResult<()>;
}

/// Content service reached over HTTP.
pub struct HttpContentSink {
    client: Client,
    base_url: String,
}

impl HttpContentSink {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpContentSink {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn videos_url(&self) -> String {
        format!("{}/videos", self.base_url)
    }
}

async fn check_status(response: reqwest::Response) -> UpstreamResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(UpstreamError::Api {
        status: status.as_u16(),
        message: response.text().await.unwrap_or_default(),
    })
}

#[async_trait]
impl ContentSink for HttpContentSink {
    async fn publish(&self, video: &ContentVideo) -> UpstreamResult<()> {
        let response = self
            .client
            .post(self.videos_url())
            .json(video)
            .send()
            .await?;
        check_status(response).await
    }

    /// `DELETE /videos?hashtag=<tag>`. The content service only serves
    /// `GET` and `POST` on `/videos` today, so until it grows this route the
    /// call fails and the caller logs it and publishes anyway.
    async fn clear_tag(&self, tag: &str) -> UpstreamResult<()> {
        let url = Url::parse_with_params(&self.videos_url(), &[("hashtag", tag)])?;
        let response = self.client.delete(url).send().await?;
        check_status(response).await
    }
}
