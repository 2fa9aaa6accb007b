use thiserror::Error;

pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

/// Failure of an outbound call to YouTube, Datamuse or the content service.
///
/// None of these are fatal: the search engine stops the current page loop
/// (or skips the current phrase) and hands back whatever it already has.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else if err.is_decode() {
            UpstreamError::Parse(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        UpstreamError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for UpstreamError {
    fn from(err: url::ParseError) -> Self {
        UpstreamError::Parse(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for UpstreamError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        UpstreamError::Timeout(err.to_string())
    }
}
