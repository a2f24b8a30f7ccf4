use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::db_init::insert_event;
use crate::events::{parse_event, ChainEvent, EventKind};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Constant-time check of the hex HMAC-SHA256 over the raw body.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Webhook consumer: verify, parse, dedup, republish, alert.
pub async fn handle_ingest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&state.cfg.webhook_secret, &body, provided) {
        warn!("webhook signature rejected");
        return StatusCode::UNAUTHORIZED;
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(err) => {
            warn!(%err, "webhook body is not JSON");
            return StatusCode::BAD_REQUEST;
        }
    };
    let batch: Vec<Value> = match payload {
        Value::Array(items) => items,
        single => vec![single],
    };

    for raw in &batch {
        let Some(event) = parse_event(raw, &state.cfg.founder, &state.cfg.treasury) else {
            continue;
        };
        let fresh = state
            .feeds
            .lock()
            .expect("feeds lock")
            .insert(event.clone());
        if !fresh {
            continue;
        }
        info!(
            signature = %event.signature,
            kind = event.kind.as_str(),
            "event ingested"
        );

        if let Some(pool) = &state.db {
            if let Err(err) = insert_event(pool, &event).await {
                error!(%err, "event log insert failed");
            }
        }

        send_alerts(&state, &event).await;
    }

    StatusCode::OK
}

async fn send_alerts(state: &AppState, event: &ChainEvent) {
    if event.kind == EventKind::Buy && event.amount_token >= state.cfg.whale_token_threshold {
        state
            .alerts
            .notify(&format!(
                "🟢 <b>Whale BUY</b>\n{} DMD ({:.3} SOL)\nTx: https://solscan.io/tx/{}",
                event.amount_token.floor(),
                event.amount_native,
                event.signature
            ))
            .await;
    }
    if event.is_treasury {
        state
            .alerts
            .notify(&format!(
                "🏦 <b>Treasury</b> movement: {:.3} SOL / {} DMD\nTx: https://solscan.io/tx/{}",
                event.amount_native,
                event.amount_token.floor(),
                event.signature
            ))
            .await;
    }
    if event.is_founder {
        state
            .alerts
            .notify(&format!(
                "👑 <b>Founder</b> event: {:.3} SOL / {} DMD\nTx: https://solscan.io/tx/{}",
                event.amount_native,
                event.amount_token.floor(),
                event.signature
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip_verifies() {
        let secret = "shared-secret";
        let body = br#"[{"signature":"5x"}]"#;
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let hex_sig = hex::encode(mac.finalize().into_bytes());

        assert!(verify_signature(secret, body, &hex_sig));
        assert!(!verify_signature(secret, b"tampered", &hex_sig));
        assert!(!verify_signature("other-secret", body, &hex_sig));
        assert!(!verify_signature(secret, body, "not-hex"));
        assert!(!verify_signature(secret, body, ""));
    }
}
