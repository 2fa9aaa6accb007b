use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::serde::{Deserialize, Serialize};
use rocket::{response, Response};
use std::io::Cursor;

/// Duration assumed for every search hit; `videoDuration=short` keeps real values under 4 minutes.
pub const PLACEHOLDER_DURATION_SECONDS: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    /// Best-effort, see `stats_estimated`.
    pub duration_seconds: i64,
    /// Best-effort, see `stats_estimated`.
    pub view_count: i64,
    pub upload_date: String,
    pub upload_timestamp: i64, // unix
    pub channel_id: Option<String>,
    pub channel_title: String,
    pub tags: Vec<String>,
    pub width: i32,
    pub height: i32,
    /// True when duration, views and dimensions are placeholders rather than
    /// values read from the platform.
    pub stats_estimated: bool,
}

impl VideoRecord {
    /// Adds a tag unless the record already carries it.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }
}

fn default_limit() -> usize {
    10
}

fn default_related_limit() -> usize {
    5
}

fn default_fresh() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub hashtag: Option<String>,
    pub channel: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_fresh")]
    pub fresh: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelatedScrapeRequest {
    pub hashtag: Option<String>,
    pub channel: Option<String>,
    /// Videos wanted per related phrase.
    #[serde(default = "default_related_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub message: String,
    pub count: usize,
    pub saved_count: usize,
    pub videos: Vec<VideoRecord>,
    #[serde(rename = "relatedKeywords", skip_serializing_if = "Option::is_none")]
    pub related_keywords: Option<Vec<String>>,
}

/// Payload accepted by the content service's `POST /videos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentVideo {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub hashtags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub channel_title: String,
    pub duration: i64,
    pub view_count: i64,
}

impl From<&VideoRecord> for ContentVideo {
    fn from(video: &VideoRecord) -> Self {
        let description = if video.description.is_empty() {
            video.title.clone()
        } else {
            video.description.clone()
        };

        ContentVideo {
            video_id: video.video_id.clone(),
            title: video.title.clone(),
            description,
            url: video.url.clone(),
            hashtags: video.tags.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            channel_title: video.channel_title.clone(),
            duration: video.duration_seconds,
            view_count: video.view_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: Status,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: &str) -> Self {
        ErrorResponse {
            status: Status::BadRequest,
            error: "bad_request".to_string(),
            message: message.to_string(),
        }
    }

    pub fn configuration_missing(message: &str) -> Self {
        ErrorResponse {
            status: Status::InternalServerError,
            error: "configuration_missing".to_string(),
            message: message.to_string(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&self).map_err(|_| Status::InternalServerError)?;
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}
