/// Parse ISO8601 date string to Unix timestamp
pub fn parse_iso8601_to_timestamp(date_str: &str) -> i64 {
    if date_str.is_empty() {
        return 0;
    }

    use chrono::{DateTime, Utc};
    if let Ok(dt) = date_str.parse::<DateTime<Utc>>() {
        return dt.timestamp();
    }

    0
}

/// Lowercased, trimmed form of a query used as the pagination key.
pub fn normalize_key(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Whitespace-split, case-folded tokens with empty tokens dropped.
pub fn keywords(input: &str) -> Vec<String> {
    input.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Channel handle without the leading `@` marker.
pub fn strip_handle(channel: &str) -> &str {
    channel.trim().trim_start_matches('@').trim()
}

/// Content-service hashtag for a topic: "Amazon DSA" -> "#amazon-dsa"
pub fn topic_tag(query: &str) -> String {
    let joined = keywords(query).join("-");
    format!("#{}", joined.trim_start_matches('#'))
}

/// Content-service tag for a channel: "@MrBeast" -> "@mrbeast"
pub fn channel_tag(channel: &str) -> String {
    format!("@{}", normalize_key(strip_handle(channel)))
}

pub fn shorts_url(video_id: &str) -> String {
    format!("https://www.youtube.com/shorts/{video_id}")
}
