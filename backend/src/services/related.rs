use crate::error::{UpstreamError, UpstreamResult};
use crate::models::VideoRecord;
use crate::services::deep_search::DeepSearchEngine;
use crate::utils::{keywords, normalize_key, topic_tag};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Words requested per association lookup.
const ASSOCIATION_LOOKUP_SIZE: usize = 10;

/// Phrases a related search fans out over.
pub const MAX_RELATED_PHRASES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationMode {
    /// Words with a similar meaning (Datamuse `ml`).
    SimilarMeaning,
    /// Words statistically triggered by the seed (Datamuse `rel_trg`).
    Triggered,
}

impl AssociationMode {
    fn query_param(self) -> &'static str {
        match self {
            AssociationMode::SimilarMeaning => "ml",
            AssociationMode::Triggered => "rel_trg",
        }
    }
}

/// Keyword association lookup. An empty list is a normal answer.
#[async_trait]
pub trait KeywordAssociation: Send + Sync {
    async fn related_words(
        &self,
        seed: &str,
        mode: AssociationMode,
        max: usize,
    ) -> UpstreamResult<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct DatamuseWord {
    word: String,
}

/// Datamuse word-finding API client.
// Documentation: https://www.datamuse.com/api/
pub struct DatamuseClient {
    client: Client,
    base_url: String,
}

impl DatamuseClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(DatamuseClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl KeywordAssociation for DatamuseClient {
    async fn related_words(
        &self,
        seed: &str,
        mode: AssociationMode,
        max: usize,
    ) -> UpstreamResult<Vec<String>> {
        let max = max.to_string();
        let url = Url::parse_with_params(
            &format!("{}/words", self.base_url),
            &[(mode.query_param(), seed), ("max", max.as_str())],
        )?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let words = response.json::<Vec<DatamuseWord>>().await?;
        Ok(words.into_iter().map(|w| w.word).collect())
    }
}

/// Expansions used when the association lookups come back empty.
fn fallback_phrases(key: &str) -> Vec<String> {
    vec![
        format!("{key} tutorial"),
        format!("{key} tips"),
        format!("{key} interview"),
        format!("{key} preparation"),
        format!("best {key}"),
    ]
}

#[derive(Debug, Default)]
pub struct RelatedResults {
    pub phrases: Vec<String>,
    pub videos: Vec<VideoRecord>,
}

/// Fans a topic out into related phrases and searches each of them.
pub struct RelatedTopicExpander {
    engine: Arc<DeepSearchEngine>,
    association: Arc<dyn KeywordAssociation>,
    lookup_timeout: Duration,
}

impl RelatedTopicExpander {
    pub fn new(
        engine: Arc<DeepSearchEngine>,
        association: Arc<dyn KeywordAssociation>,
        lookup_timeout: Duration,
    ) -> Self {
        RelatedTopicExpander {
            engine,
            association,
            lookup_timeout,
        }
    }

    async fn lookup(&self, seed: &str, mode: AssociationMode) -> Vec<String> {
        let lookup = self
            .association
            .related_words(seed, mode, ASSOCIATION_LOOKUP_SIZE);
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(words)) => words,
            Ok(Err(e)) => {
                warn!("Keyword association for '{seed}' ({mode:?}) failed: {e}");
                Vec::new()
            }
            Err(_) => {
                warn!("Keyword association for '{seed}' ({mode:?}) timed out");
                Vec::new()
            }
        }
    }

    /// Up to `max_results` phrases of the form "<query> <associated word>".
    /// Falls back to templated expansions when no association is found.
    pub async fn related_phrases(&self, query: &str, max_results: usize) -> Vec<String> {
        let key = normalize_key(query);
        if key.is_empty() || max_results == 0 {
            return Vec::new();
        }

        let tokens = keywords(&key);
        let mut seeds = vec![key.clone()];
        if tokens.len() > 1 {
            seeds.extend(tokens.iter().cloned());
        }

        let mut phrases = Vec::new();
        let mut seen = HashSet::from([key.clone()]);

        'modes: for mode in [AssociationMode::SimilarMeaning, AssociationMode::Triggered] {
            for seed in &seeds {
                for word in self.lookup(seed, mode).await {
                    let word = normalize_key(&word);
                    if word.is_empty() || tokens.contains(&word) || key.contains(word.as_str()) {
                        continue;
                    }

                    let phrase = format!("{key} {word}");
                    if seen.insert(phrase.to_lowercase()) {
                        phrases.push(phrase);
                    }
                    if phrases.len() >= max_results {
                        break 'modes;
                    }
                }
            }
        }

        if phrases.is_empty() {
            info!("No associations for '{key}', using templated expansions");
            phrases = fallback_phrases(&key)
                .into_iter()
                .filter(|phrase| seen.insert(phrase.to_lowercase()))
                .collect();
        }

        phrases.truncate(max_results);
        phrases
    }

    /// Searches every related phrase for up to `per_topic_limit` videos.
    /// Each video is tagged with the topic and its phrase, and appears once
    /// across all phrases.
    pub async fn related_search(&self, query: &str, per_topic_limit: usize) -> RelatedResults {
        let key = normalize_key(query);
        if key.is_empty() {
            return RelatedResults::default();
        }

        let phrases = self.related_phrases(&key, MAX_RELATED_PHRASES).await;
        let parent_tag = topic_tag(&key);

        let mut batch_seen = HashSet::new();
        let mut videos = Vec::new();
        for phrase in &phrases {
            let found = self
                .engine
                .phrase_search(phrase, &parent_tag, per_topic_limit, &mut batch_seen)
                .await;
            info!("Related phrase '{phrase}' contributed {} videos", found.len());
            videos.extend(found);
        }

        RelatedResults { phrases, videos }
    }
}
