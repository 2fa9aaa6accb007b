use crate::services::content_sink::HttpContentSink;
use crate::services::cursor_store::CursorStore;
use crate::services::deep_search::{DeepSearchEngine, SearchSettings};
use crate::services::related::{DatamuseClient, RelatedTopicExpander};
use crate::services::scrape_service::Scraper;
use crate::services::youtube_client::YouTubeClient;
use crate::AppState;
use anyhow::Result;
use env_logger::Builder;
use lazy_static::lazy_static;
use log::{info, warn, LevelFilter};
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

lazy_static! {
    /// Without a key the service still boots but refuses scrape requests.
    pub static ref YOUTUBE_API_KEY: Option<String> = env::var("YOUTUBE_API_KEY")
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());
    pub static ref CONTENT_SERVICE_URL: String =
        env::var("CONTENT_SERVICE_URL").unwrap_or_else(|_| "http://content-service:8083".to_string());
    pub static ref DATAMUSE_URL: String =
        env::var("DATAMUSE_URL").unwrap_or_else(|_| "https://api.datamuse.com".to_string());
    pub static ref YOUTUBE_PAGE_SIZE: u32 = env_or("YOUTUBE_PAGE_SIZE", 50);
    pub static ref MAX_PAGES_PER_CALL: usize = env_or("MAX_PAGES_PER_CALL", 5);
    pub static ref RELATED_MAX_PAGES: usize = env_or("RELATED_MAX_PAGES", 2);
    pub static ref SEARCH_TIMEOUT_SECS: u64 = env_or("SEARCH_TIMEOUT_SECS", 10);
    pub static ref ASSOCIATION_TIMEOUT_SECS: u64 = env_or("ASSOCIATION_TIMEOUT_SECS", 3);
    pub static ref CURSOR_TTL_SECS: u64 = env_or("CURSOR_TTL_SECS", 6 * 60 * 60);
    pub static ref CURSOR_CAPACITY: usize = env_or("CURSOR_CAPACITY", 1024);
    pub static ref CORS_ALLOWED_ORIGIN: String =
        env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
}

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    info!("Starting scraper service...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn search_settings() -> SearchSettings {
    SearchSettings {
        page_size: *YOUTUBE_PAGE_SIZE,
        max_pages: *MAX_PAGES_PER_CALL,
        related_max_pages: *RELATED_MAX_PAGES,
    }
}

fn create_scraper(api_key: &str) -> Result<Scraper> {
    let timeout = Duration::from_secs(*SEARCH_TIMEOUT_SECS);
    let association_timeout = Duration::from_secs(*ASSOCIATION_TIMEOUT_SECS);

    let youtube = YouTubeClient::new(api_key, timeout)?;
    let cursors = CursorStore::new(*CURSOR_CAPACITY, Duration::from_secs(*CURSOR_TTL_SECS));
    let engine = Arc::new(DeepSearchEngine::new(
        Arc::new(youtube),
        Arc::new(cursors),
        search_settings(),
    ));

    info!("Keyword associations from: {}", &*DATAMUSE_URL);
    let datamuse = DatamuseClient::new(&DATAMUSE_URL, association_timeout)?;
    let expander = RelatedTopicExpander::new(engine.clone(), Arc::new(datamuse), association_timeout);

    info!("Publishing videos to: {}", &*CONTENT_SERVICE_URL);
    let sink = HttpContentSink::new(&CONTENT_SERVICE_URL, timeout)?;

    Ok(Scraper::new(engine, expander, Arc::new(sink)))
}

pub fn create_app_state() -> Result<AppState> {
    let scraper = match YOUTUBE_API_KEY.as_deref() {
        Some(api_key) => Some(create_scraper(api_key)?),
        None => {
            warn!("YOUTUBE_API_KEY is not set; scrape endpoints will answer 500 until it is configured");
            None
        }
    };

    Ok(AppState { scraper })
}

pub fn create_cors() -> Result<rocket_cors::Cors> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&[CORS_ALLOWED_ORIGIN.as_str()]))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&["Accept", "Content-Type"]))
        .allow_credentials(true)
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}
