use std::time::Duration;

use serde_json::json;
use tracing::warn;

/// Telegram Bot API alerts. Unconfigured means every notify is a no-op;
/// a send failure is logged and swallowed, never propagated.
#[derive(Clone)]
pub struct Alerts {
    http: reqwest::Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl Alerts {
    pub fn new(http: reqwest::Client, bot_token: Option<String>, chat_id: Option<String>) -> Self {
        Self {
            http,
            bot_token,
            chat_id,
        }
    }

    pub async fn notify(&self, text: &str) {
        let (Some(token), Some(chat_id)) = (&self.bot_token, &self.chat_id) else {
            return;
        };
        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        let result = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(5))
            .json(&body)
            .send()
            .await;
        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "telegram send rejected");
            }
            Err(err) => warn!(%err, "telegram send failed"),
            _ => {}
        }
    }
}
