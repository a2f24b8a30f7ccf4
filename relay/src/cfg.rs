use clap::Parser;
use vault_client::{DEFAULT_FOUNDER, DEFAULT_MINT, DEFAULT_PROGRAM_ID, DEFAULT_TREASURY};

#[derive(Parser, Debug, Clone)]
pub struct Cfg {
    #[arg(long, env = "PORT", default_value_t = 8787)]
    pub port: u16,

    #[arg(long, env = "RPC_URL")]
    pub rpc_url: String,

    /// Durable event log. The relay runs memory-only without it.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "PROGRAM_ID", default_value = DEFAULT_PROGRAM_ID)]
    pub program_id: String,

    #[arg(long, env = "DMD_MINT", default_value = DEFAULT_MINT)]
    pub mint: String,

    #[arg(long, env = "TREASURY_PUBKEY", default_value = DEFAULT_TREASURY)]
    pub treasury: String,

    #[arg(long, env = "FOUNDER_PUBKEY", default_value = DEFAULT_FOUNDER)]
    pub founder: String,

    /// Shared secret for webhook signature verification.
    #[arg(long, env = "WEBHOOK_SECRET")]
    pub webhook_secret: String,

    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<String>,

    #[arg(long, env = "TELEGRAM_ADMIN_CHAT_ID")]
    pub telegram_admin_chat_id: Option<String>,

    /// Buys at or above this many tokens trigger a whale alert.
    #[arg(long, env = "WHALE_DMD", default_value_t = 100_000.0)]
    pub whale_token_threshold: f64,

    #[arg(long, env = "PRICE_DEVIATION_PCT", default_value_t = 3.0)]
    pub price_deviation_pct: f64,

    #[arg(long, env = "PRICE_WATCH_SECS", default_value_t = 15)]
    pub price_watch_secs: u64,

    // Pricing parameters
    #[arg(long, env = "DEX_PAIR")]
    pub dex_pair: Option<String>,

    #[arg(long, env = "PYTH_SOL_USD_ID")]
    pub pyth_feed_id: Option<String>,

    #[arg(long, env = "ALLOW_COINGECKO", default_value_t = false, num_args(0..=1), value_parser = clap::value_parser!(bool))]
    pub allow_coingecko: bool,

    #[arg(long, env = "FLOOR_USD", default_value_t = 0.0)]
    pub floor_usd: f64,

    #[arg(long, env = "TREASURY_WEIGHT", default_value_t = 1.0)]
    pub treasury_weight: f64,

    #[arg(long, env = "MAX_SUPPLY", default_value_t = 150_000_000)]
    pub max_supply: u64,

    #[arg(long, env = "HOLDER_LIMIT", default_value_t = 25)]
    pub holder_limit: usize,
}
