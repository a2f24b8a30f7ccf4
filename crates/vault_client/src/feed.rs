//! Client for the relay's REST event feed. The relay is optional
//! infrastructure: when it is absent or unreachable the feed is simply
//! empty, never an error state.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    pub signature: String,
    pub kind: String,
    #[serde(default)]
    pub wallet: String,
    #[serde(default)]
    pub amount_native: f64,
    #[serde(default)]
    pub amount_token: f64,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Fetches the newest events, degrading to an empty feed on any failure.
pub async fn fetch_events(http: &reqwest::Client, base_url: &str, limit: usize) -> Vec<FeedEvent> {
    let url = format!("{}/api/events?limit={limit}", base_url.trim_end_matches('/'));
    match fetch(http, &url).await {
        Ok(events) => events,
        Err(reason) => {
            warn!(%reason, "event feed unavailable; showing empty feed");
            Vec::new()
        }
    }
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<Vec<FeedEvent>, String> {
    http.get(url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?
        .json::<Vec<FeedEvent>>()
        .await
        .map_err(|e| e.to_string())
}
