use crate::error::UpstreamResult;
use crate::models::VideoRecord;
use crate::services::channel_resolver::resolve_channel_id;
use crate::services::cursor_store::CursorStore;
use crate::services::mapper::{item_video_id, map_search_item};
use crate::services::relevance::RelevanceQuery;
use crate::services::youtube_client::{SearchPage, VideoSearch};
use crate::utils::{channel_tag, normalize_key, strip_handle, topic_tag};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// `maxResults` per `search.list` call.
    pub page_size: u32,
    /// Pages one deep search may fetch before handing control back to the caller.
    pub max_pages: usize,
    /// Page cap for each related phrase.
    pub related_max_pages: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            page_size: 50,
            max_pages: 5,
            related_max_pages: 2,
        }
    }
}

enum PageSource<'a> {
    Query(&'a str),
    Channel(&'a str),
}

/// One bounded scroll over a page source.
struct Scroll<'a> {
    source: PageSource<'a>,
    key: &'a str,
    tags: &'a [String],
    /// `None` accepts every mapped item (channel listings).
    relevance: Option<&'a RelevanceQuery>,
    target: usize,
    max_pages: usize,
}

/// Biases keyword searches towards Shorts.
fn shorts_query(query: &str) -> String {
    if query.to_lowercase().contains("shorts") {
        query.to_string()
    } else {
        format!("{query} shorts")
    }
}

/// Drives paginated searches, keeps relevant unseen videos and remembers
/// where each query or channel left off.
pub struct DeepSearchEngine {
    search: Arc<dyn VideoSearch>,
    cursors: Arc<CursorStore>,
    settings: SearchSettings,
}

impl DeepSearchEngine {
    pub fn new(
        search: Arc<dyn VideoSearch>,
        cursors: Arc<CursorStore>,
        settings: SearchSettings,
    ) -> Self {
        DeepSearchEngine {
            search,
            cursors,
            settings,
        }
    }

    pub fn cursors(&self) -> &CursorStore {
        &self.cursors
    }

    /// Up to `target_count` relevant videos for `query`, continuing the
    /// previous scroll for the same query unless `fresh`.
    pub async fn deep_search(&self, query: &str, target_count: usize, fresh: bool) -> Vec<VideoRecord> {
        let key = normalize_key(query);
        if key.is_empty() || target_count == 0 {
            return Vec::new();
        }

        let relevance = RelevanceQuery::new(&key);
        let tags = vec![topic_tag(&key)];
        let search_query = shorts_query(&key);

        self.cursors.begin(&key, fresh);
        let videos = self
            .scroll(
                &Scroll {
                    source: PageSource::Query(&search_query),
                    key: &key,
                    tags: &tags,
                    relevance: Some(&relevance),
                    target: target_count,
                    max_pages: self.settings.max_pages,
                },
                &mut HashSet::new(),
            )
            .await;

        info!("Deep search '{key}' returned {} videos", videos.len());
        videos
    }

    /// Up to `target_count` newest short videos of a channel. No relevance
    /// filter is applied; an unknown channel yields an empty list.
    pub async fn deep_channel_search(
        &self,
        channel: &str,
        target_count: usize,
        fresh: bool,
    ) -> Vec<VideoRecord> {
        if strip_handle(channel).is_empty() || target_count == 0 {
            return Vec::new();
        }

        let Some(channel_id) = resolve_channel_id(self.search.as_ref(), channel).await else {
            return Vec::new();
        };

        let key = channel_tag(channel);
        let tags = vec![key.clone()];

        self.cursors.begin(&key, fresh);
        let videos = self
            .scroll(
                &Scroll {
                    source: PageSource::Channel(&channel_id),
                    key: &key,
                    tags: &tags,
                    relevance: None,
                    target: target_count,
                    max_pages: self.settings.max_pages,
                },
                &mut HashSet::new(),
            )
            .await;

        info!("Channel search '{key}' returned {} videos", videos.len());
        videos
    }

    /// Searches one related phrase. Results carry both the parent topic tag
    /// and the phrase's own tag; ids already in `batch_seen` are skipped.
    /// Phrase scrolls always resume.
    pub async fn phrase_search(
        &self,
        phrase: &str,
        parent_tag: &str,
        target_count: usize,
        batch_seen: &mut HashSet<String>,
    ) -> Vec<VideoRecord> {
        let key = normalize_key(phrase);
        if key.is_empty() || target_count == 0 {
            return Vec::new();
        }

        let relevance = RelevanceQuery::new(&key);
        let tags = vec![parent_tag.to_string(), topic_tag(&key)];
        let search_query = shorts_query(&key);

        self.cursors.begin(&key, false);
        self.scroll(
            &Scroll {
                source: PageSource::Query(&search_query),
                key: &key,
                tags: &tags,
                relevance: Some(&relevance),
                target: target_count,
                max_pages: self.settings.related_max_pages,
            },
            batch_seen,
        )
        .await
    }

    async fn fetch_page(&self, source: &PageSource<'_>, token: Option<&str>) -> UpstreamResult<SearchPage> {
        match source {
            PageSource::Query(query) => {
                self.search
                    .search_videos(query, self.settings.page_size, token)
                    .await
            }
            PageSource::Channel(channel_id) => {
                self.search
                    .search_channel_videos(channel_id, self.settings.page_size, token)
                    .await
            }
        }
    }

    async fn scroll(&self, scroll: &Scroll<'_>, batch_seen: &mut HashSet<String>) -> Vec<VideoRecord> {
        let key = scroll.key;
        let mut accepted: Vec<VideoRecord> = Vec::new();
        let mut pages = 0;

        while pages < scroll.max_pages && accepted.len() < scroll.target {
            let token = self.cursors.continuation(key);
            pages += 1;

            let page = match self.fetch_page(&scroll.source, token.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Search for '{key}' failed on page {pages}, keeping {} videos: {e}", accepted.len());
                    break;
                }
            };

            if page.items.is_empty() {
                debug!("'{key}' exhausted after {pages} pages");
                self.cursors.advance(key, None);
                break;
            }

            let mut page_cut_short = false;
            for item in &page.items {
                if accepted.len() >= scroll.target {
                    page_cut_short = true;
                    break;
                }

                let Some(video_id) = item_video_id(item) else {
                    debug!("Skipping search item without video id");
                    continue;
                };
                if batch_seen.contains(video_id) || self.cursors.is_seen(key, video_id) {
                    continue;
                }

                let Some(video) = map_search_item(item, scroll.tags) else {
                    debug!("Skipping malformed search item {video_id}");
                    continue;
                };

                if let Some(relevance) = scroll.relevance {
                    if !relevance.accepts(&video.title, &video.description, &video.channel_title) {
                        debug!("Rejected '{}' for '{key}'", video.title);
                        continue;
                    }
                }

                if self.cursors.mark_seen(key, video_id) {
                    batch_seen.insert(video_id.to_string());
                    accepted.push(video);
                }
            }

            // unread items stay reachable: the next call re-reads this page
            if page_cut_short {
                break;
            }

            let exhausted = page.next_page_token.is_none();
            self.cursors.advance(key, page.next_page_token);
            if exhausted {
                debug!("'{key}' has no further pages");
                break;
            }
        }

        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{video_item, ScriptedSearch};
    use std::time::Duration;

    fn engine(search: Arc<ScriptedSearch>, settings: SearchSettings) -> DeepSearchEngine {
        DeepSearchEngine::new(
            search,
            Arc::new(CursorStore::new(64, Duration::from_secs(3600))),
            settings,
        )
    }

    fn ids(videos: &[VideoRecord]) -> Vec<&str> {
        videos.iter().map(|v| v.video_id.as_str()).collect()
    }

    #[tokio::test]
    async fn relevant_titles_are_accepted_and_vetoed_ones_dropped() {
        let search = Arc::new(ScriptedSearch::new().on_page(
            "",
            vec![
                video_item("a", "Amazon DSA interview"),
                video_item("b", "Amazon Prime Haul"),
                video_item("c", "DSA at Amazon in 60 seconds"),
            ],
            None,
        ));
        let engine = engine(search.clone(), SearchSettings::default());

        let videos = engine.deep_search("Amazon DSA", 10, true).await;
        assert_eq!(ids(&videos), vec!["a", "c"]);
        assert!(videos.iter().all(|v| v.tags == vec!["#amazon-dsa"]));
        assert_eq!(search.calls()[0].query, "amazon dsa shorts");
    }

    #[tokio::test]
    async fn repeated_ids_across_pages_appear_once() {
        let search = Arc::new(
            ScriptedSearch::new()
                .on_page(
                    "",
                    vec![
                        video_item("a", "rust tip 1"),
                        video_item("b", "rust tip 2"),
                        video_item("c", "rust tip 3"),
                        video_item("d", "rust tip 4"),
                    ],
                    Some("p2"),
                )
                .on_page(
                    "p2",
                    vec![
                        video_item("b", "rust tip 2"),
                        video_item("e", "rust tip 5"),
                        video_item("c", "rust tip 3"),
                        video_item("d", "rust tip 4"),
                    ],
                    None,
                ),
        );
        let engine = engine(search, SearchSettings::default());

        let videos = engine.deep_search("rust", 50, true).await;
        assert_eq!(ids(&videos), vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn never_exceeds_target_and_resumes_mid_page() {
        let search = Arc::new(ScriptedSearch::new().on_page(
            "",
            (0..6).map(|i| video_item(&format!("v{i}"), "rust")).collect(),
            Some("p2"),
        ));
        let engine = engine(search.clone(), SearchSettings::default());

        let first = engine.deep_search("rust", 4, true).await;
        assert_eq!(ids(&first), vec!["v0", "v1", "v2", "v3"]);
        // page was not finished, so it is read again rather than skipped
        assert!(engine.cursors().continuation("rust").is_none());

        let second = engine.deep_search("rust", 4, false).await;
        assert_eq!(ids(&second), vec!["v4", "v5"]);
        assert_eq!(search.calls()[2].token.as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn page_cap_bounds_fetches_and_scroll_continues_next_call() {
        let mut search = ScriptedSearch::new();
        for page in 0..10 {
            let token = if page == 0 { String::new() } else { format!("p{page}") };
            search = search.on_page(
                &token,
                vec![video_item(&format!("v{page}"), "off topic")],
                Some(&format!("p{}", page + 1)),
            );
        }
        let search = Arc::new(search);
        let settings = SearchSettings {
            max_pages: 3,
            ..SearchSettings::default()
        };
        let engine = engine(search.clone(), settings);

        let videos = engine.deep_search("rust", 5, true).await;
        assert!(videos.is_empty());
        assert_eq!(search.page_fetches(), 3);
        assert_eq!(engine.cursors().continuation("rust").as_deref(), Some("p3"));

        engine.deep_search("rust", 5, false).await;
        assert_eq!(search.page_fetches(), 6);
        assert_eq!(search.calls()[3].token.as_deref(), Some("p3"));
    }

    #[tokio::test]
    async fn upstream_error_returns_partial_results() {
        let search = Arc::new(
            ScriptedSearch::new()
                .on_page("", vec![video_item("a", "rust"), video_item("b", "rust")], Some("p2"))
                .failing_at("p2"),
        );
        let engine = engine(search, SearchSettings::default());

        let videos = engine.deep_search("rust", 10, true).await;
        assert_eq!(ids(&videos), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn empty_page_marks_key_exhausted() {
        let search = Arc::new(
            ScriptedSearch::new()
                .on_page("", vec![video_item("a", "rust")], Some("p2"))
                .on_page("p2", vec![], Some("p3")),
        );
        let engine = engine(search.clone(), SearchSettings::default());

        let videos = engine.deep_search("rust", 10, true).await;
        assert_eq!(ids(&videos), vec!["a"]);
        assert_eq!(search.page_fetches(), 2);
        assert!(engine.cursors().continuation("rust").is_none());
    }

    #[tokio::test]
    async fn non_fresh_retry_after_exhaustion_yields_nothing_new() {
        let search = Arc::new(ScriptedSearch::new().on_page(
            "",
            vec![video_item("a", "rust"), video_item("b", "rust")],
            None,
        ));
        let engine = engine(search, SearchSettings::default());

        assert_eq!(engine.deep_search("rust", 10, true).await.len(), 2);
        assert!(engine.deep_search("rust", 10, false).await.is_empty());
        assert_eq!(engine.deep_search("rust", 10, true).await.len(), 2);
    }

    #[tokio::test]
    async fn malformed_items_are_skipped() {
        let mut broken = video_item("x", "rust");
        broken["snippet"].as_object_mut().unwrap().remove("publishedAt");
        let search = Arc::new(ScriptedSearch::new().on_page(
            "",
            vec![broken, serde_json::json!({ "id": {} }), video_item("a", "rust")],
            None,
        ));
        let engine = engine(search, SearchSettings::default());

        assert_eq!(ids(&engine.deep_search("rust", 10, true).await), vec!["a"]);
    }

    #[tokio::test]
    async fn zero_target_or_blank_query_fetches_nothing() {
        let search = Arc::new(ScriptedSearch::new().on_page("", vec![video_item("a", "rust")], None));
        let engine = engine(search.clone(), SearchSettings::default());

        assert!(engine.deep_search("rust", 0, true).await.is_empty());
        assert!(engine.deep_search("   ", 5, true).await.is_empty());
        assert_eq!(search.page_fetches(), 0);
    }

    #[tokio::test]
    async fn channel_search_skips_relevance_and_tags_channel() {
        let search = Arc::new(
            ScriptedSearch::new()
                .with_channel("MrBeast", "UCX6")
                .on_page(
                    "",
                    vec![video_item("a", "I gave away a house"), video_item("b", "Prank gone right")],
                    None,
                ),
        );
        let engine = engine(search.clone(), SearchSettings::default());

        let videos = engine.deep_channel_search("@MrBeast", 10, true).await;
        assert_eq!(ids(&videos), vec!["a", "b"]);
        assert!(videos.iter().all(|v| v.tags == vec!["@mrbeast"]));
        assert_eq!(search.calls()[0].query, "UCX6");
        assert!(engine.cursors().get("@mrbeast").is_some());
    }

    #[tokio::test]
    async fn unknown_channel_returns_empty_list() {
        let search = Arc::new(ScriptedSearch::new().on_page("", vec![video_item("a", "x")], None));
        let engine = engine(search.clone(), SearchSettings::default());

        assert!(engine.deep_channel_search("@doesnotexist123", 10, true).await.is_empty());
        assert_eq!(search.page_fetches(), 0);
    }

    #[tokio::test]
    async fn phrase_search_skips_batch_seen_ids_and_double_tags() {
        let search = Arc::new(ScriptedSearch::new().on_page(
            "",
            vec![video_item("a", "cooking vlog tips"), video_item("b", "cooking vlog tips")],
            None,
        ));
        let engine = engine(search, SearchSettings::default());

        let mut batch_seen = HashSet::from(["a".to_string()]);
        let videos = engine
            .phrase_search("cooking vlog tips", "#cooking-vlog", 5, &mut batch_seen)
            .await;
        assert_eq!(ids(&videos), vec!["b"]);
        assert_eq!(videos[0].tags, vec!["#cooking-vlog", "#cooking-vlog-tips"]);
        assert!(batch_seen.contains("b"));
    }
}
