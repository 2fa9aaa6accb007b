use crate::models::{ContentVideo, ScrapeResponse, VideoRecord};
use crate::services::content_sink::ContentSink;
use crate::services::deep_search::DeepSearchEngine;
use crate::services::related::RelatedTopicExpander;
use crate::utils::{channel_tag, strip_handle, topic_tag};
use log::{error, info, warn};
use std::sync::Arc;

/// What a scrape request asks for. A channel wins over a hashtag.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeTarget {
    Channel(String),
    Topic(String),
}

impl ScrapeTarget {
    pub fn from_fields(hashtag: Option<&str>, channel: Option<&str>) -> Option<Self> {
        let channel = channel.map(strip_handle).unwrap_or("");
        if !channel.is_empty() {
            return Some(ScrapeTarget::Channel(channel.to_string()));
        }

        let topic = hashtag.map(|h| h.trim().trim_start_matches('#').trim()).unwrap_or("");
        if !topic.is_empty() {
            return Some(ScrapeTarget::Topic(topic.to_string()));
        }

        None
    }

    /// Content-service bucket for this target.
    pub fn tag(&self) -> String {
        match self {
            ScrapeTarget::Channel(handle) => channel_tag(handle),
            ScrapeTarget::Topic(topic) => topic_tag(topic),
        }
    }

    /// Text related searches expand from.
    pub fn seed(&self) -> &str {
        match self {
            ScrapeTarget::Channel(handle) => handle,
            ScrapeTarget::Topic(topic) => topic,
        }
    }
}

/// Runs searches for inbound requests and publishes what they find.
pub struct Scraper {
    engine: Arc<DeepSearchEngine>,
    expander: RelatedTopicExpander,
    sink: Arc<dyn ContentSink>,
}

impl Scraper {
    pub fn new(
        engine: Arc<DeepSearchEngine>,
        expander: RelatedTopicExpander,
        sink: Arc<dyn ContentSink>,
    ) -> Self {
        Scraper {
            engine,
            expander,
            sink,
        }
    }

    pub async fn scrape(&self, target: &ScrapeTarget, limit: usize, fresh: bool) -> ScrapeResponse {
        let videos = match target {
            ScrapeTarget::Channel(handle) => {
                info!("Searching channel: {handle}");
                self.engine.deep_channel_search(handle, limit, fresh).await
            }
            ScrapeTarget::Topic(topic) => {
                info!("Searching topic: {topic}");
                self.engine.deep_search(topic, limit, fresh).await
            }
        };

        if fresh && !videos.is_empty() {
            let tag = target.tag();
            if let Err(e) = self.sink.clear_tag(&tag).await {
                warn!("Failed to clear previous videos for {tag}: {e}");
            }
        }

        let saved_count = self.publish(&videos).await;
        ScrapeResponse {
            message: format!("Found {} videos, Saved {}", videos.len(), saved_count),
            count: videos.len(),
            saved_count,
            videos,
            related_keywords: None,
        }
    }

    pub async fn scrape_related(&self, target: &ScrapeTarget, per_topic_limit: usize) -> ScrapeResponse {
        info!("Searching topics related to: {}", target.seed());
        let related = self
            .expander
            .related_search(target.seed(), per_topic_limit)
            .await;

        let saved_count = self.publish(&related.videos).await;
        ScrapeResponse {
            message: format!(
                "Found {} related videos across {} keywords, Saved {}",
                related.videos.len(),
                related.phrases.len(),
                saved_count
            ),
            count: related.videos.len(),
            saved_count,
            videos: related.videos,
            related_keywords: Some(related.phrases),
        }
    }

    async fn publish(&self, videos: &[VideoRecord]) -> usize {
        let mut saved_count = 0;
        for video in videos {
            match self.sink.publish(&ContentVideo::from(video)).await {
                Ok(()) => {
                    saved_count += 1;
                    info!("Saved video: {}", video.title);
                }
                Err(e) => {
                    error!("Failed to save video {}: {e}", video.video_id);
                }
            }
        }
        saved_count
    }
}
