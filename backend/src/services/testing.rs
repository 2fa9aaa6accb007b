//! In-memory stand-ins for YouTube, Datamuse and the content service.

use crate::error::{UpstreamError, UpstreamResult};
use crate::models::ContentVideo;
use crate::services::content_sink::ContentSink;
use crate::services::related::{AssociationMode, KeywordAssociation};
use crate::services::youtube_client::{SearchPage, VideoSearch};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A `search.list` video item with the fields the mapper needs.
pub fn video_item(video_id: &str, title: &str) -> Value {
    json!({
        "kind": "youtube#searchResult",
        "id": { "kind": "youtube#video", "videoId": video_id },
        "snippet": {
            "publishedAt": "2024-05-01T12:00:00Z",
            "channelId": "UCtest",
            "title": title,
            "description": "",
            "channelTitle": "Test Channel",
            "thumbnails": {
                "high": { "url": format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg") }
            }
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    /// Search text, or the channel id for channel listings.
    pub query: String,
    pub token: Option<String>,
}

struct ScriptedPage {
    query: Option<String>,
    token: String,
    items: Vec<Value>,
    next: Option<String>,
}

/// Serves pages by (query, page token). Unscripted pages come back empty.
#[derive(Default)]
pub struct ScriptedSearch {
    pages: Vec<ScriptedPage>,
    failing: HashSet<String>,
    channels: HashMap<String, String>,
    calls: Mutex<Vec<SearchCall>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page for any query. The first page has token "".
    pub fn on_page(self, token: &str, items: Vec<Value>, next: Option<&str>) -> Self {
        self.script(None, token, items, next)
    }

    pub fn on_query_page(self, query: &str, token: &str, items: Vec<Value>, next: Option<&str>) -> Self {
        self.script(Some(query), token, items, next)
    }

    fn script(mut self, query: Option<&str>, token: &str, items: Vec<Value>, next: Option<&str>) -> Self {
        self.pages.push(ScriptedPage {
            query: query.map(String::from),
            token: token.to_string(),
            items,
            next: next.map(String::from),
        });
        self
    }

    /// Fetching this token (or any query with this text) fails.
    pub fn failing_at(mut self, token_or_query: &str) -> Self {
        self.failing.insert(token_or_query.to_string());
        self
    }

    pub fn with_channel(mut self, name: &str, channel_id: &str) -> Self {
        self.channels.insert(name.to_string(), channel_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn page_fetches(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn serve(&self, query: &str, page_token: Option<&str>) -> UpstreamResult<SearchPage> {
        self.calls.lock().unwrap().push(SearchCall {
            query: query.to_string(),
            token: page_token.map(String::from),
        });

        let token = page_token.unwrap_or("");
        if self.failing.contains(token) || self.failing.contains(query) {
            return Err(UpstreamError::Network("connection reset".to_string()));
        }

        let page = self
            .pages
            .iter()
            .find(|p| p.token == token && p.query.as_deref() == Some(query))
            .or_else(|| {
                self.pages
                    .iter()
                    .find(|p| p.token == token && p.query.is_none())
            });

        Ok(match page {
            Some(page) => SearchPage {
                items: page.items.clone(),
                next_page_token: page.next.clone(),
            },
            None => SearchPage::default(),
        })
    }
}

#[async_trait]
impl VideoSearch for ScriptedSearch {
    async fn search_videos(
        &self,
        query: &str,
        _page_size: u32,
        page_token: Option<&str>,
    ) -> UpstreamResult<SearchPage> {
        self.serve(query, page_token)
    }

    async fn search_channel_videos(
        &self,
        channel_id: &str,
        _page_size: u32,
        page_token: Option<&str>,
    ) -> UpstreamResult<SearchPage> {
        self.serve(channel_id, page_token)
    }

    async fn find_channel_id(&self, name: &str) -> UpstreamResult<Option<String>> {
        Ok(self.channels.get(name).cloned())
    }
}

/// Word lists by (mode, seed). Unknown seeds have no associations.
#[derive(Default)]
pub struct ScriptedAssociation {
    words: HashMap<(AssociationMode, String), Vec<String>>,
    failing: HashSet<String>,
    lookups: Mutex<Vec<(AssociationMode, String)>>,
}

impl ScriptedAssociation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, mode: AssociationMode, seed: &str, words: &[&str]) -> Self {
        self.words.insert(
            (mode, seed.to_string()),
            words.iter().map(|w| w.to_string()).collect(),
        );
        self
    }

    pub fn failing_for(mut self, seed: &str) -> Self {
        self.failing.insert(seed.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<(AssociationMode, String)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeywordAssociation for ScriptedAssociation {
    async fn related_words(
        &self,
        seed: &str,
        mode: AssociationMode,
        max: usize,
    ) -> UpstreamResult<Vec<String>> {
        self.lookups.lock().unwrap().push((mode, seed.to_string()));
        if self.failing.contains(seed) {
            return Err(UpstreamError::Timeout("datamuse".to_string()));
        }
        let mut words = self
            .words
            .get(&(mode, seed.to_string()))
            .cloned()
            .unwrap_or_default();
        words.truncate(max);
        Ok(words)
    }
}

/// Collects published videos and cleared tags.
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<ContentVideo>>,
    cleared: Mutex<Vec<String>>,
    rejecting: HashSet<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishing this video id fails.
    pub fn rejecting(mut self, video_id: &str) -> Self {
        self.rejecting.insert(video_id.to_string());
        self
    }

    pub fn published(&self) -> Vec<ContentVideo> {
        self.published.lock().unwrap().clone()
    }

    pub fn cleared(&self) -> Vec<String> {
        self.cleared.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSink for RecordingSink {
    async fn publish(&self, video: &ContentVideo) -> UpstreamResult<()> {
        if self.rejecting.contains(&video.video_id) {
            return Err(UpstreamError::Api {
                status: 500,
                message: "duplicate key".to_string(),
            });
        }
        self.published.lock().unwrap().push(video.clone());
        Ok(())
    }

    async fn clear_tag(&self, tag: &str) -> UpstreamResult<()> {
        self.cleared.lock().unwrap().push(tag.to_string());
        Ok(())
    }
}
