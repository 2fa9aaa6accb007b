use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Scroll state of one normalized query or channel key.
#[derive(Debug, Clone)]
pub struct SearchCursor {
    pub key: String,
    /// `None` before the first page and after the source ran dry.
    pub continuation_token: Option<String>,
    pub seen_ids: HashSet<String>,
    last_touched: Instant,
}

impl SearchCursor {
    fn new(key: &str, now: Instant) -> Self {
        SearchCursor {
            key: key.to_string(),
            continuation_token: None,
            seen_ids: HashSet::new(),
            last_touched: now,
        }
    }
}

/// Process-wide pagination state, keyed by normalized query/channel.
///
/// Entries idle for longer than `ttl` are dropped, and once more than
/// `capacity` keys are held the least recently touched ones go first.
pub struct CursorStore {
    cursors: Arc<Mutex<HashMap<String, SearchCursor>>>,
    capacity: usize,
    ttl: Duration,
}

impl CursorStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        CursorStore {
            cursors: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
            ttl,
        }
    }

    // a panic while holding the lock leaves the map itself intact
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SearchCursor>> {
        self.cursors.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a scroll for `key`. `fresh` throws away the stored token and
    /// seen ids, otherwise the previous scroll is resumed.
    pub fn begin(&self, key: &str, fresh: bool) {
        let now = Instant::now();
        let mut cursors = self.lock();
        self.evict(&mut cursors, now, key);

        if fresh {
            debug!("Fresh scroll for '{key}'");
            cursors.insert(key.to_string(), SearchCursor::new(key, now));
        } else {
            cursors
                .entry(key.to_string())
                .or_insert_with(|| SearchCursor::new(key, now))
                .last_touched = now;
        }
    }

    pub fn continuation(&self, key: &str) -> Option<String> {
        self.lock()
            .get(key)
            .and_then(|cursor| cursor.continuation_token.clone())
    }

    /// Stores the token for the next page, or marks `key` exhausted when
    /// there is none. Seen ids are kept either way.
    pub fn advance(&self, key: &str, next_token: Option<String>) {
        let now = Instant::now();
        let mut cursors = self.lock();
        let cursor = cursors
            .entry(key.to_string())
            .or_insert_with(|| SearchCursor::new(key, now));
        cursor.continuation_token = next_token;
        cursor.last_touched = now;
    }

    /// Records `video_id` as delivered for `key`. Returns false if it already was.
    pub fn mark_seen(&self, key: &str, video_id: &str) -> bool {
        let now = Instant::now();
        let mut cursors = self.lock();
        cursors
            .entry(key.to_string())
            .or_insert_with(|| SearchCursor::new(key, now))
            .seen_ids
            .insert(video_id.to_string())
    }

    pub fn is_seen(&self, key: &str, video_id: &str) -> bool {
        self.lock()
            .get(key)
            .map(|cursor| cursor.seen_ids.contains(video_id))
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<SearchCursor> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn evict(&self, cursors: &mut HashMap<String, SearchCursor>, now: Instant, keep: &str) {
        let before = cursors.len();
        cursors.retain(|_, cursor| now.saturating_duration_since(cursor.last_touched) <= self.ttl);

        // room for `keep` if it is about to be created
        let limit = if cursors.contains_key(keep) {
            self.capacity
        } else {
            self.capacity - 1
        };
        while cursors.len() > limit {
            let oldest = cursors
                .iter()
                .filter(|(key, _)| key.as_str() != keep)
                .min_by_key(|(_, cursor)| cursor.last_touched)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    cursors.remove(&key);
                }
                None => break,
            }
        }

        if cursors.len() < before {
            debug!("Evicted {} scroll cursors", before - cursors.len());
        }
    }
}
