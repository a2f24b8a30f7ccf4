use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::PriceError;
use crate::providers::{dex_pair_url, parse_dex_pair, spot_providers, ProviderSpec};

/// Smallest native units per whole SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Uniform bound on every external fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a last-known-good spot value may stand in for a fresh one.
pub const SPOT_CACHE_TTL: Duration = Duration::from_secs(20);

/// A SOL/USD figure must land in this range to be believed at all.
pub fn plausible_spot(v: f64) -> bool {
    v.is_finite() && v > 0.5 && v < 10_000.0
}

/// Token prices can be very small but must still be positive and finite.
pub fn plausible_token_usd(v: f64) -> bool {
    v.is_finite() && v > 0.0 && v < 10_000.0
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Relay base URL; enables the relay `/api/price` provider.
    pub relay_base: Option<String>,
    /// Hermes feed id; enables the Pyth provider.
    pub pyth_feed_id: Option<String>,
    pub allow_coingecko: bool,
    /// Development escape hatch, consulted only after every live source
    /// failed. Still plausibility-checked.
    pub dev_spot_usd: Option<f64>,
}

/// A resolved spot rate and which provider supplied it.
#[derive(Debug, Clone, Copy)]
pub struct Spot {
    pub usd: f64,
    pub source: &'static str,
}

struct CachedSpot {
    spot: Spot,
    at: Instant,
}

pub struct PriceEngine {
    http: reqwest::Client,
    cfg: EngineConfig,
    providers: Vec<ProviderSpec>,
    cache: Mutex<Option<CachedSpot>>,
}

impl PriceEngine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self::with_providers(cfg, spot_providers())
    }

    /// The provider list is data; callers (and tests) may supply their own.
    pub fn with_providers(cfg: EngineConfig, providers: Vec<ProviderSpec>) -> Self {
        Self {
            http: reqwest::Client::new(),
            cfg,
            providers,
            cache: Mutex::new(None),
        }
    }

    /// Resolves SOL/USD: first plausible answer from the provider race wins;
    /// a recent cached value short-circuits the race entirely; when
    /// everything fails the result is an explicit error, never a stale or
    /// zero rate dressed up as fresh.
    pub async fn fetch_spot(&self) -> Result<Spot, PriceError> {
        if let Some(spot) = self.cached_spot(Instant::now()) {
            debug!(source = spot.source, value = spot.usd, "spot from cache");
            return Ok(spot);
        }

        let mut set = JoinSet::new();
        for provider in &self.providers {
            let Some(url) = (provider.url)(&self.cfg) else {
                continue;
            };
            let http = self.http.clone();
            let name = provider.name;
            let parse = provider.parse;
            set.spawn(async move {
                match fetch_json(&http, &url).await {
                    Ok(json) => match parse(&json).filter(|v| plausible_spot(*v)) {
                        Some(v) => Some((name, v)),
                        None => {
                            warn!(source = name, "source unavailable: implausible or missing value");
                            None
                        }
                    },
                    Err(reason) => {
                        warn!(source = name, %reason, "source unavailable");
                        None
                    }
                }
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Ok(Some((source, usd))) = joined {
                set.abort_all();
                info!(source, value = usd, "spot price resolved");
                let spot = Spot { usd, source };
                *self.cache.lock().expect("cache lock") = Some(CachedSpot {
                    spot,
                    at: Instant::now(),
                });
                return Ok(spot);
            }
        }

        if let Some(usd) = self.cfg.dev_spot_usd.filter(|v| plausible_spot(*v)) {
            info!(value = usd, "spot price from dev override");
            return Ok(Spot { usd, source: "dev-override" });
        }

        warn!("all spot sources exhausted");
        Err(PriceError::AllSourcesExhausted)
    }

    fn cached_spot(&self, now: Instant) -> Option<Spot> {
        let cache = self.cache.lock().expect("cache lock");
        cache
            .as_ref()
            .filter(|c| now.duration_since(c.at) < SPOT_CACHE_TTL)
            .filter(|c| plausible_spot(c.spot.usd))
            .map(|c| c.spot)
    }

    /// Looks up the token's own DEX pair price, if a pair is configured.
    /// A provider outage or shape change here is contained: the result is
    /// simply absent.
    pub async fn fetch_dex_usd(&self, pair: &str) -> Option<f64> {
        match fetch_json(&self.http, &dex_pair_url(pair)).await {
            Ok(json) => {
                let (usd, _native) = parse_dex_pair(&json);
                usd.filter(|v| plausible_token_usd(*v))
            }
            Err(reason) => {
                warn!(source = "dexscreener", %reason, "source unavailable");
                None
            }
        }
    }

    /// One full reconciliation cycle: spot race and DEX lookup run
    /// concurrently, then the pure blend.
    pub async fn compute_pricing(&self, input: &PricingInput) -> Pricing {
        let dex_fut = async {
            match &input.dex_pair {
                Some(pair) => self.fetch_dex_usd(pair).await,
                None => None,
            }
        };
        let (spot, dex_usd) = tokio::join!(self.fetch_spot(), dex_fut);
        blend(spot.ok(), dex_usd, input)
    }
}

async fn fetch_json(http: &reqwest::Client, url: &str) -> Result<Value, String> {
    http.get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?
        .json::<Value>()
        .await
        .map_err(|e| e.to_string())
}

/// Inputs the caller observed elsewhere (on-chain reads, holder counts).
#[derive(Debug, Clone)]
pub struct PricingInput {
    pub lamports_per_10k: Option<u64>,
    pub treasury_lamports: Option<u64>,
    pub circulating_override: Option<u64>,
    pub max_supply: u64,
    /// A floor of `0` means "no floor candidate".
    pub floor_usd: f64,
    pub holders: u64,
    pub presale_pool: u64,
    /// Clamped into `[0, 1]`.
    pub treasury_weight: f64,
    pub dex_pair: Option<String>,
}

impl Default for PricingInput {
    fn default() -> Self {
        Self {
            lamports_per_10k: None,
            treasury_lamports: None,
            circulating_override: None,
            max_supply: 150_000_000,
            floor_usd: 0.0,
            holders: 0,
            presale_pool: 0,
            treasury_weight: 1.0,
            dex_pair: None,
        }
    }
}

/// The reconciled advisory figure plus every sub-value and a note trail
/// naming where each one came from. Advisory only: nothing here ever
/// authorizes a transaction.
#[derive(Debug, Clone)]
pub struct Pricing {
    pub spot_usd: Option<f64>,
    pub spot_source: Option<&'static str>,
    pub manual_usd: Option<f64>,
    pub backing_usd: Option<f64>,
    pub backing_usd_weighted: Option<f64>,
    pub dex_usd: Option<f64>,
    pub final_usd: Option<f64>,
    pub holder_factor: f64,
    pub notes: Vec<String>,
}

/// Smooth, bounded nudge from holder count: `0.98 + 0.02·log10(holders+1)`,
/// clamped into `[0.98, 1.08]`.
pub fn holder_factor(holders: u64) -> f64 {
    let raw = 0.98 + 0.02 * ((holders as f64) + 1.0).log10();
    raw.clamp(0.98, 1.08)
}

/// Pure blend of the observed sub-values into one advisory USD-per-token
/// figure. `None` means unknown and must be rendered as such, never as zero.
pub fn blend(spot: Option<Spot>, dex_usd: Option<f64>, input: &PricingInput) -> Pricing {
    let mut notes = Vec::new();

    let factor = holder_factor(input.holders);
    if input.holders > 0 {
        notes.push(format!("holders={} factor={:.4}", input.holders, factor));
    }

    let spot_usd = spot.map(|s| s.usd);
    let spot_source = spot.map(|s| s.source);
    match spot {
        Some(s) => notes.push(format!("spot={:.4} via {}", s.usd, s.source)),
        None => notes.push("spot unknown; all sources exhausted".into()),
    }

    let manual_usd = match (input.lamports_per_10k, spot_usd) {
        (Some(lamports), Some(rate)) => {
            let sol_per_10k = lamports as f64 / LAMPORTS_PER_SOL as f64;
            let usd = sol_per_10k * rate / 10_000.0;
            notes.push(format!("manual={usd:.8}"));
            Some(usd)
        }
        _ => {
            notes.push("manual not computed".into());
            None
        }
    };

    let circulating = match input.circulating_override {
        Some(c) if c > 0 => {
            notes.push(format!("circulating(override)={c}"));
            c
        }
        _ => {
            let c = input.max_supply.saturating_sub(input.presale_pool).max(1);
            notes.push(format!("circulating(calc)={c}"));
            c
        }
    };

    let weight = input.treasury_weight.clamp(0.0, 1.0);
    let (backing_usd, backing_usd_weighted) = match (input.treasury_lamports, spot_usd) {
        (Some(lamports), Some(rate)) => {
            let treasury_usd = lamports as f64 / LAMPORTS_PER_SOL as f64 * rate;
            let backing = treasury_usd / circulating as f64;
            let weighted = backing * weight;
            notes.push(format!("backing={backing:.10} w={weight:.2} -> {weighted:.10}"));
            (Some(backing), Some(weighted))
        }
        _ => {
            notes.push("backing not computed".into());
            (None, None)
        }
    };

    if let Some(usd) = dex_usd {
        notes.push(format!("dex={usd:.8}"));
    }

    let candidates = [
        Some(input.floor_usd),
        manual_usd,
        backing_usd_weighted,
        dex_usd,
    ];
    let base = candidates
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(None::<f64>, |best, v| Some(best.map_or(v, |b| b.max(v))));

    let final_usd = match base {
        Some(base) => {
            let v = base * factor;
            notes.push(format!("final={base:.8}*{factor:.4}={v:.8}"));
            Some(v)
        }
        None => {
            notes.push("no final price; every candidate absent".into());
            None
        }
    };

    Pricing {
        spot_usd,
        spot_source,
        manual_usd,
        backing_usd,
        backing_usd_weighted,
        dex_usd,
        final_usd,
        holder_factor: factor,
        notes,
    }
}

/// Renders a USD figure for display. Unknown is the literal `"…"`, never a
/// zero price that would read as "worthless".
pub fn format_usd(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("${v:.digits$}"),
        _ => "…".to_string(),
    }
}
