mod engine;
mod error;
mod providers;

pub use engine::{
    blend, format_usd, holder_factor, plausible_spot, plausible_token_usd, EngineConfig,
    PriceEngine, Pricing, PricingInput, Spot, FETCH_TIMEOUT, LAMPORTS_PER_SOL, SPOT_CACHE_TTL,
};
pub use error::PriceError;
pub use providers::{dex_pair_url, parse_dex_pair, spot_providers, ProviderSpec};
