pub mod channel_resolver;
pub mod content_sink;
pub mod cursor_store;
pub mod deep_search;
pub mod mapper;
pub mod related;
pub mod relevance;
pub mod scrape_service;
pub mod youtube_client;

#[cfg(test)]
pub mod testing;
