use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use price_engine::PricingInput;

use crate::app_state::AppState;
use crate::events::ChainEvent;
use crate::holders::top_holders;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

fn clamp_limit(query: &FeedQuery) -> usize {
    query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

pub async fn handle_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Json<Vec<ChainEvent>> {
    let feeds = state.feeds.lock().expect("feeds lock");
    Json(feeds.public_events(clamp_limit(&query)))
}

pub async fn handle_treasury_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Json<Vec<ChainEvent>> {
    let feeds = state.feeds.lock().expect("feeds lock");
    Json(feeds.treasury_events(clamp_limit(&query)))
}

pub async fn handle_founder_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Json<Vec<ChainEvent>> {
    let feeds = state.feeds.lock().expect("feeds lock");
    Json(feeds.founder_events(clamp_limit(&query)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub vault_sol: f64,
    pub treasury_sol: f64,
    pub founder_sol: f64,
    pub public_sale_active: bool,
}

/// Vault / treasury / founder balances, fetched in one fan-out.
pub async fn handle_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, StatusCode> {
    let vault = state.program.vault();
    let result = tokio::try_join!(
        state.reader.balance(&vault),
        state.reader.balance(&state.program.treasury),
        state.reader.balance(&state.program.founder),
    );
    let (vault_lamports, treasury_lamports, founder_lamports) = match result {
        Ok(balances) => balances,
        Err(err) => {
            error!(%err, "stats read failed");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let public_sale_active = match state.reader.vault_config().await {
        Ok(cfg) => cfg.public_sale_active,
        Err(_) => false,
    };
    Ok(Json(StatsResponse {
        vault_sol: vault_lamports as f64 / 1e9,
        treasury_sol: treasury_lamports as f64 / 1e9,
        founder_sol: founder_lamports as f64 / 1e9,
        public_sale_active,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub sol_usd: Option<f64>,
    pub dmd_usd: Option<f64>,
    pub dmd_per_sol: Option<f64>,
    pub source: Option<&'static str>,
}

/// The reconciled advisory price. Unknown values serialize as null; the
/// consumer renders them as unknown, never as zero.
pub async fn handle_price(State(state): State<Arc<AppState>>) -> Json<PriceResponse> {
    // On-chain observations are optional inputs; a missing vault just means
    // fewer candidates for the blend.
    let (vault, treasury_lamports) = tokio::join!(
        state.reader.vault_config(),
        state.reader.treasury_lamports(),
    );
    let vault = vault.ok();

    let input = PricingInput {
        lamports_per_10k: vault.as_ref().map(|v| v.manual_price_lamports_per_10k),
        treasury_lamports: treasury_lamports.ok(),
        presale_pool: vault.as_ref().map(|v| v.presale_sold).unwrap_or(0),
        ..state.pricing_input()
    };
    let pricing = state.engine.compute_pricing(&input).await;

    let dmd_per_sol = vault
        .as_ref()
        .map(|v| v.manual_price_lamports_per_10k)
        .filter(|p| *p > 0)
        .map(|p| 10_000.0 * 1e9 / p as f64);

    Json(PriceResponse {
        sol_usd: pricing.spot_usd,
        dmd_usd: pricing.final_usd,
        dmd_per_sol,
        source: pricing.spot_source,
    })
}

#[derive(Debug, Serialize)]
pub struct HolderEntry {
    pub owner: String,
    pub amount: f64,
}

pub async fn handle_holders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HolderEntry>>, StatusCode> {
    match top_holders(&state.rpc, &state.program.mint, state.cfg.holder_limit).await {
        Ok(holders) => Ok(Json(holders)),
        Err(err) => {
            error!(%err, "holders read failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_and_clamp() {
        assert_eq!(clamp_limit(&FeedQuery { limit: None }), 50);
        assert_eq!(clamp_limit(&FeedQuery { limit: Some(10) }), 10);
        assert_eq!(clamp_limit(&FeedQuery { limit: Some(100_000) }), 200);
    }
}
