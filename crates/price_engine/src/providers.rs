//! Spot-price providers as data. Each provider is a descriptor: how to build
//! its URL (None = disabled under the current config) and how to read a
//! SOL/USD figure out of its response shape. Adding, removing or reordering
//! a provider is an edit to [`spot_providers`], not a control-flow change.

use serde_json::Value;

use crate::engine::EngineConfig;

pub struct ProviderSpec {
    pub name: &'static str,
    pub url: fn(&EngineConfig) -> Option<String>,
    pub parse: fn(&Value) -> Option<f64>,
}

/// Ordered by preference; the race logs which one actually won.
pub fn spot_providers() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec {
            name: "relay",
            url: |cfg| {
                cfg.relay_base
                    .as_ref()
                    .map(|base| format!("{}/api/price", base.trim_end_matches('/')))
            },
            parse: |j| number(&j["solUsd"]),
        },
        ProviderSpec {
            name: "cryptocompare",
            url: |_| {
                Some("https://min-api.cryptocompare.com/data/price?fsym=SOL&tsyms=USD".into())
            },
            parse: |j| number(&j["USD"]),
        },
        ProviderSpec {
            name: "jupiter-v6",
            url: |_| Some("https://price.jup.ag/v6/price?ids=SOL".into()),
            parse: parse_jupiter,
        },
        ProviderSpec {
            name: "jupiter-v4",
            url: |_| Some("https://price.jup.ag/v4/price?ids=SOL".into()),
            parse: parse_jupiter,
        },
        ProviderSpec {
            name: "pyth-hermes",
            url: |cfg| {
                cfg.pyth_feed_id.as_ref().map(|id| {
                    format!("https://hermes.pyth.network/v2/updates/price/latest?ids[]={id}")
                })
            },
            parse: parse_pyth,
        },
        ProviderSpec {
            name: "coingecko",
            url: |cfg| {
                cfg.allow_coingecko.then(|| {
                    "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd"
                        .into()
                })
            },
            parse: |j| number(&j["solana"]["usd"]),
        },
    ]
}

fn parse_jupiter(j: &Value) -> Option<f64> {
    number(&j["data"]["SOL"]["price"]).or_else(|| number(&j["data"]["SOL"]))
}

fn parse_pyth(j: &Value) -> Option<f64> {
    let p = &j["parsed"][0]["price"];
    let price = number(&p["price"])?;
    let expo = p["expo"].as_i64().unwrap_or(0) as i32;
    Some(price * 10f64.powi(expo))
}

/// Providers disagree on whether numbers arrive as JSON numbers or strings
/// (Dexscreener sends strings); accept both.
pub fn number(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.parse::<f64>().ok()))
}

/// Dexscreener pair lookup: USD and native price of the token itself.
pub fn dex_pair_url(pair: &str) -> String {
    format!("https://api.dexscreener.com/latest/dex/pairs/solana/{pair}")
}

pub fn parse_dex_pair(j: &Value) -> (Option<f64>, Option<f64>) {
    let p = &j["pairs"][0];
    (number(&p["priceUsd"]), number(&p["priceNative"]))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn provider(name: &str) -> ProviderSpec {
        spot_providers()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap()
    }

    #[test]
    fn cryptocompare_shape() {
        let j = json!({ "USD": 151.32 });
        assert_eq!((provider("cryptocompare").parse)(&j), Some(151.32));
        assert_eq!((provider("cryptocompare").parse)(&json!({})), None);
    }

    #[test]
    fn jupiter_shapes() {
        let v6 = json!({ "data": { "SOL": { "id": "SOL", "price": 149.9 } } });
        let v4 = json!({ "data": { "SOL": 150.1 } });
        assert_eq!((provider("jupiter-v6").parse)(&v6), Some(149.9));
        assert_eq!((provider("jupiter-v4").parse)(&v4), Some(150.1));
    }

    #[test]
    fn pyth_applies_exponent() {
        let j = json!({ "parsed": [ { "price": { "price": "15012345678", "expo": -8 } } ] });
        let v = (provider("pyth-hermes").parse)(&j).unwrap();
        assert!((v - 150.12345678).abs() < 1e-9);
    }

    #[test]
    fn coingecko_shape() {
        let j = json!({ "solana": { "usd": 148.77 } });
        assert_eq!((provider("coingecko").parse)(&j), Some(148.77));
    }

    #[test]
    fn relay_shape() {
        let j = json!({ "solUsd": 150.0, "dmdUsd": 0.0075, "dmdPerSol": 10000.0 });
        assert_eq!((provider("relay").parse)(&j), Some(150.0));
    }

    #[test]
    fn dexscreener_string_prices() {
        let j = json!({ "pairs": [ { "priceUsd": "0.00082", "priceNative": "0.0000055" } ] });
        let (usd, native) = parse_dex_pair(&j);
        assert_eq!(usd, Some(0.00082));
        assert_eq!(native, Some(0.0000055));
        assert_eq!(parse_dex_pair(&json!({ "pairs": [] })), (None, None));
    }

    #[test]
    fn disabled_providers_build_no_url() {
        let cfg = EngineConfig::default();
        assert_eq!((provider("relay").url)(&cfg), None);
        assert_eq!((provider("pyth-hermes").url)(&cfg), None);
        assert_eq!((provider("coingecko").url)(&cfg), None);
        assert!((provider("cryptocompare").url)(&cfg).is_some());
    }
}
