use std::sync::Arc;
use std::time::Duration;

use price_engine::blend;
use tokio::time::interval;
use tracing::{debug, info};

use crate::app_state::AppState;

/// Periodically compares the DEX price against the manual anchor and alerts
/// when they drift apart. Requires a configured DEX pair; without one the
/// watcher never starts.
pub async fn watch_loop(state: Arc<AppState>) {
    let Some(pair) = state.cfg.dex_pair.clone() else {
        info!("no DEX pair configured; price watcher disabled");
        return;
    };
    info!(pair, "price watcher running");

    let mut ticker = interval(Duration::from_secs(state.cfg.price_watch_secs.max(1)));
    loop {
        ticker.tick().await;
        if let Some(deviation_pct) = check_once(&state, &pair).await {
            if deviation_pct > state.cfg.price_deviation_pct {
                state
                    .alerts
                    .notify(&format!("⚠️ DMD price deviation {deviation_pct:.2} %"))
                    .await;
            }
        }
    }
}

async fn check_once(state: &AppState, pair: &str) -> Option<f64> {
    let (vault, spot, dex_usd) = tokio::join!(
        state.reader.vault_config(),
        state.engine.fetch_spot(),
        state.engine.fetch_dex_usd(pair),
    );

    let input = price_engine::PricingInput {
        lamports_per_10k: vault.ok().map(|v| v.manual_price_lamports_per_10k),
        ..state.pricing_input()
    };
    let pricing = blend(spot.ok(), dex_usd, &input);

    let (manual, dex) = (pricing.manual_usd?, pricing.dex_usd?);
    if manual <= 0.0 {
        return None;
    }
    let deviation = (dex - manual).abs() / manual * 100.0;
    debug!(manual, dex, deviation, "price deviation check");
    Some(deviation)
}
