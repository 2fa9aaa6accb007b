use crate::error::{UpstreamError, UpstreamResult};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";

/// `search.list` caps `maxResults` at 50.
pub const MAX_PAGE_SIZE: u32 = 50;

/// One page of `search.list` items plus the token for the next one.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<Value>,
    pub next_page_token: Option<String>,
}

/// Backing video search. All requests are restricted to short videos.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Keyword search for videos.
    async fn search_videos(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> UpstreamResult<SearchPage>;

    /// Newest-first uploads of one channel.
    async fn search_channel_videos(
        &self,
        channel_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> UpstreamResult<SearchPage>;

    /// Best-match channel id for a name, `None` if the search found nothing.
    async fn find_channel_id(&self, name: &str) -> UpstreamResult<Option<String>>;
}

/// YouTube Data API v3 client.
// Documentation: https://developers.google.com/youtube/v3/docs/search/list
pub struct YouTubeClient {
    client: Client,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(YouTubeClient {
            client,
            api_key: api_key.to_string(),
        })
    }

    async fn search(&self, params: &[(&str, &str)]) -> UpstreamResult<Value> {
        let mut url = Url::parse(SEARCH_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("part", "snippet")
            .extend_pairs(params)
            .append_pair("key", &self.api_key);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

fn to_page(response: Value) -> SearchPage {
    let items = match response["items"].as_array() {
        Some(items) => items.clone(),
        None => Vec::new(),
    };

    SearchPage {
        items,
        next_page_token: response["nextPageToken"].as_str().map(String::from),
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search_videos(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> UpstreamResult<SearchPage> {
        let max_results = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("q", query),
            ("type", "video"),
            ("videoDuration", "short"), // < 4 mins
            ("maxResults", max_results.as_str()),
            ("relevanceLanguage", "en"),
            ("safeSearch", "moderate"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        debug!("search.list q={query:?} pageToken={page_token:?}");
        Ok(to_page(self.search(&params).await?))
    }

    async fn search_channel_videos(
        &self,
        channel_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> UpstreamResult<SearchPage> {
        let max_results = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("channelId", channel_id),
            ("type", "video"),
            ("videoDuration", "short"),
            ("order", "date"),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        debug!("search.list channelId={channel_id} pageToken={page_token:?}");
        Ok(to_page(self.search(&params).await?))
    }

    async fn find_channel_id(&self, name: &str) -> UpstreamResult<Option<String>> {
        let response = self
            .search(&[("q", name), ("type", "channel"), ("maxResults", "1")])
            .await?;

        let first = &response["items"][0];
        let channel_id = first["id"]["channelId"]
            .as_str()
            .or_else(|| first["snippet"]["channelId"].as_str())
            .map(String::from);
        Ok(channel_id)
    }
}
