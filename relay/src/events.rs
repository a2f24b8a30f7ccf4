use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Buy,
    Sell,
    Claim,
    Transfer,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Buy => "buy",
            EventKind::Sell => "sell",
            EventKind::Claim => "claim",
            EventKind::Transfer => "transfer",
        }
    }
}

/// One chain event as republished on the REST feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEvent {
    pub signature: String,
    pub kind: EventKind,
    pub wallet: String,
    pub amount_token: f64,
    pub amount_native: f64,
    pub timestamp_ms: i64,
    pub is_founder: bool,
    pub is_treasury: bool,
}

/// Classifies an event from the program's log lines.
pub fn detect_kind(logs: &[String]) -> EventKind {
    if logs.iter().any(|l| l.contains("buy_dmd")) {
        EventKind::Buy
    } else if logs.iter().any(|l| l.contains("sell_dmd")) {
        EventKind::Sell
    } else if logs.iter().any(|l| l.contains("claim_reward")) {
        EventKind::Claim
    } else {
        EventKind::Transfer
    }
}

/// Maps one raw webhook record to a feed event. Records with no signature
/// are dropped; everything else is best-effort.
pub fn parse_event(raw: &Value, founder: &str, treasury: &str) -> Option<ChainEvent> {
    let signature = raw["signature"].as_str()?.to_string();
    let logs: Vec<String> = raw["logs"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let kind = detect_kind(&logs);

    let lamports = raw["nativeTransfers"][0]["amount"].as_f64().unwrap_or(0.0);
    let amount_native = lamports / 1e9;
    let amount_token = raw["metadata"]["dmd"].as_f64().unwrap_or(0.0);
    let wallet = raw["feePayer"]
        .as_str()
        .or_else(|| raw["signer"].as_str())
        .unwrap_or_default()
        .to_string();
    let timestamp_ms = raw["timestamp"]
        .as_i64()
        .map(|s| s * 1000)
        .unwrap_or_else(|| Utc::now().timestamp_millis());

    Some(ChainEvent {
        is_founder: wallet == founder,
        is_treasury: wallet == treasury,
        signature,
        kind,
        wallet,
        amount_token,
        amount_native,
        timestamp_ms,
    })
}

/// Bounded in-memory feeds, newest first, deduplicated by signature.
#[derive(Debug, Default)]
pub struct Feeds {
    public: VecDeque<ChainEvent>,
    treasury: VecDeque<ChainEvent>,
    founder: VecDeque<ChainEvent>,
    seen: HashSet<String>,
}

pub const MAX_KEEP: usize = 500;

impl Feeds {
    /// Returns false when the signature was already ingested.
    pub fn insert(&mut self, event: ChainEvent) -> bool {
        if !self.seen.insert(event.signature.clone()) {
            return false;
        }
        if event.is_treasury {
            push_bounded(&mut self.treasury, event.clone());
        }
        if event.is_founder {
            push_bounded(&mut self.founder, event.clone());
        }
        push_bounded(&mut self.public, event);
        true
    }

    pub fn public_events(&self, limit: usize) -> Vec<ChainEvent> {
        self.public.iter().take(limit).cloned().collect()
    }

    pub fn treasury_events(&self, limit: usize) -> Vec<ChainEvent> {
        self.treasury.iter().take(limit).cloned().collect()
    }

    pub fn founder_events(&self, limit: usize) -> Vec<ChainEvent> {
        self.founder.iter().take(limit).cloned().collect()
    }
}

fn push_bounded(deque: &mut VecDeque<ChainEvent>, event: ChainEvent) {
    deque.push_front(event);
    if deque.len() > MAX_KEEP {
        deque.pop_back();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const FOUNDER: &str = "AqPFb5LWQuzKiyoKTX9XgUwsYWoFvpeE8E8uzQvnDTzT";
    const TREASURY: &str = "CEUmazdgtbUCcQyLq6NCm4BuQbvCsYFzKsS5wdRvZehV";

    fn raw_buy(signature: &str, wallet: &str) -> Value {
        json!({
            "signature": signature,
            "feePayer": wallet,
            "timestamp": 1_700_000_000,
            "logs": ["Program log: Instruction: buy_dmd"],
            "nativeTransfers": [ { "amount": 1_500_000_000u64 } ],
            "metadata": { "dmd": 15_000.0 }
        })
    }

    #[test]
    fn kind_detection_from_logs() {
        let buy = vec!["Program log: Instruction: buy_dmd".to_string()];
        let sell = vec!["Program log: Instruction: sell_dmd_v2".to_string()];
        let claim = vec!["Program log: Instruction: claim_reward_v2".to_string()];
        assert_eq!(detect_kind(&buy), EventKind::Buy);
        assert_eq!(detect_kind(&sell), EventKind::Sell);
        assert_eq!(detect_kind(&claim), EventKind::Claim);
        assert_eq!(detect_kind(&[]), EventKind::Transfer);
    }

    #[test]
    fn parse_event_maps_amounts_and_flags() {
        let event = parse_event(&raw_buy("5xabc", TREASURY), FOUNDER, TREASURY).unwrap();
        assert_eq!(event.kind, EventKind::Buy);
        assert_eq!(event.amount_native, 1.5);
        assert_eq!(event.amount_token, 15_000.0);
        assert_eq!(event.timestamp_ms, 1_700_000_000_000);
        assert!(event.is_treasury);
        assert!(!event.is_founder);
    }

    #[test]
    fn missing_signature_is_dropped() {
        assert!(parse_event(&json!({ "logs": [] }), FOUNDER, TREASURY).is_none());
    }

    #[test]
    fn feeds_dedup_by_signature() {
        let mut feeds = Feeds::default();
        let event = parse_event(&raw_buy("5xabc", "someone"), FOUNDER, TREASURY).unwrap();
        assert!(feeds.insert(event.clone()));
        assert!(!feeds.insert(event));
        assert_eq!(feeds.public_events(10).len(), 1);
    }

    #[test]
    fn feeds_are_bounded_and_newest_first() {
        let mut feeds = Feeds::default();
        for i in 0..(MAX_KEEP + 10) {
            let event =
                parse_event(&raw_buy(&format!("sig{i}"), "someone"), FOUNDER, TREASURY).unwrap();
            feeds.insert(event);
        }
        let listed = feeds.public_events(MAX_KEEP * 2);
        assert_eq!(listed.len(), MAX_KEEP);
        assert_eq!(listed[0].signature, format!("sig{}", MAX_KEEP + 9));
    }

    #[test]
    fn founder_and_treasury_events_route_to_their_feeds() {
        let mut feeds = Feeds::default();
        feeds.insert(parse_event(&raw_buy("a", FOUNDER), FOUNDER, TREASURY).unwrap());
        feeds.insert(parse_event(&raw_buy("b", TREASURY), FOUNDER, TREASURY).unwrap());
        feeds.insert(parse_event(&raw_buy("c", "other"), FOUNDER, TREASURY).unwrap());
        assert_eq!(feeds.public_events(10).len(), 3);
        assert_eq!(feeds.founder_events(10).len(), 1);
        assert_eq!(feeds.treasury_events(10).len(), 1);
    }
}
