use crate::services::youtube_client::VideoSearch;
use crate::utils::strip_handle;
use log::{info, warn};

/// Resolves a channel handle such as `@MrBeast` to its channel id with a
/// single best-match lookup. Lookup failures resolve to `None`.
pub async fn resolve_channel_id(search: &dyn VideoSearch, handle: &str) -> Option<String> {
    let clean_name = strip_handle(handle);
    if clean_name.is_empty() {
        return None;
    }

    match search.find_channel_id(clean_name).await {
        Ok(Some(channel_id)) => {
            info!("Resolved channel {handle} -> {channel_id}");
            Some(channel_id)
        }
        Ok(None) => {
            info!("Channel not found: {handle}");
            None
        }
        Err(e) => {
            warn!("Error resolving channel ID for {handle}: {e}");
            None
        }
    }
}
