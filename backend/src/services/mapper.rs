use crate::models::{VideoRecord, PLACEHOLDER_DURATION_SECONDS};
use crate::utils::{parse_iso8601_to_timestamp, shorts_url};
use serde_json::Value;

/// Highest resolution first.
const THUMBNAIL_PREFERENCE: [&str; 5] = ["maxres", "standard", "high", "medium", "default"];

/// `id.videoId` of a `search.list` item, if present.
pub fn item_video_id(item: &Value) -> Option<&str> {
    item["id"]["videoId"].as_str()
}

/// Maps a `search.list` item to a `VideoRecord`. Returns `None` if any of
/// id, title, channel title or publish time is missing.
///
/// The search listing carries no statistics or content details, so
/// duration, views and dimensions are placeholders.
pub fn map_search_item(item: &Value, tags: &[String]) -> Option<VideoRecord> {
    let video_id = item_video_id(item)?;
    let snippet = &item["snippet"];
    let title = snippet["title"].as_str()?;
    let channel_title = snippet["channelTitle"].as_str()?;
    let published_at = snippet["publishedAt"].as_str()?;

    let thumbnail_url = THUMBNAIL_PREFERENCE
        .iter()
        .find_map(|size| snippet["thumbnails"][*size]["url"].as_str())
        .map(String::from);

    let mut video = VideoRecord {
        video_id: video_id.to_string(),
        title: title.to_string(),
        description: snippet["description"].as_str().unwrap_or("").to_string(),
        url: shorts_url(video_id),
        thumbnail_url,
        duration_seconds: PLACEHOLDER_DURATION_SECONDS,
        view_count: 0,
        upload_date: published_at.to_string(),
        upload_timestamp: parse_iso8601_to_timestamp(published_at),
        channel_id: snippet["channelId"].as_str().map(String::from),
        channel_title: channel_title.to_string(),
        tags: Vec::with_capacity(tags.len()),
        width: 0,
        height: 0,
        stats_estimated: true,
    };
    for tag in tags {
        video.add_tag(tag);
    }

    Some(video)
}
