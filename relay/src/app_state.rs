use std::sync::{Arc, Mutex};

use price_engine::{PriceEngine, PricingInput};
use solana_client::nonblocking::rpc_client::RpcClient;
use sqlx::PgPool;
use vault_client::{ProgramConfig, VaultReader};

use crate::cfg::Cfg;
use crate::events::Feeds;
use crate::telegram::Alerts;

pub struct AppState {
    pub cfg: Cfg,
    pub program: ProgramConfig,
    pub rpc: Arc<RpcClient>,
    pub reader: VaultReader,
    pub engine: PriceEngine,
    pub feeds: Mutex<Feeds>,
    pub db: Option<PgPool>,
    pub alerts: Alerts,
}

impl AppState {
    /// Pricing inputs that come from configuration; on-chain observations
    /// (manual price, treasury balance) are filled in per request.
    pub fn pricing_input(&self) -> PricingInput {
        PricingInput {
            max_supply: self.cfg.max_supply,
            floor_usd: self.cfg.floor_usd,
            treasury_weight: self.cfg.treasury_weight,
            dex_pair: self.cfg.dex_pair.clone(),
            ..PricingInput::default()
        }
    }
}
