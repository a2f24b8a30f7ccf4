//! Typed records for the program's account layouts. These are produced only
//! by the codec's decode path, so every consumer gets checked field access
//! instead of reaching into raw bytes.

use solana_sdk::pubkey::Pubkey;

use crate::codec::{decode_account_as, DecodedAccount, Value};
use crate::error::CodecError;
use crate::schema::Schema;

/// On-chain vault configuration. Read-only from this layer's perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub owner: Pubkey,
    pub total_supply: u64,
    pub presale_sold: u64,
    pub manual_price_lamports_per_10k: u64,
    pub public_sale_active: bool,
    pub mint: Pubkey,
    /// Scaling between displayed amounts and base units. Authoritative;
    /// nothing in this workspace assumes a fixed decimal count.
    pub mint_decimals: u8,
}

/// Per-wallet state tracked by the program. Every field is an observation
/// that must be re-read before each decision; another client or the chain
/// itself may have changed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerState {
    pub whitelisted: bool,
    pub total_tokens: u64,
    pub holding_since: i64,
    pub last_sell_at: i64,
    pub last_reward_claim_at: i64,
}

impl VaultConfig {
    pub fn decode(schema: &Schema, data: &[u8]) -> Result<Self, CodecError> {
        let def = schema
            .accounts
            .iter()
            .find(|a| a.name == "VaultConfig")
            .expect("VaultConfig layout present in schema");
        let decoded = decode_account_as(def, data)?;
        Ok(Self {
            owner: get_pubkey(&decoded, "owner"),
            total_supply: get_u64(&decoded, "total_supply"),
            presale_sold: get_u64(&decoded, "presale_sold"),
            manual_price_lamports_per_10k: get_u64(&decoded, "manual_price_lamports_per_10k"),
            public_sale_active: get_bool(&decoded, "public_sale_active"),
            mint: get_pubkey(&decoded, "mint"),
            mint_decimals: get_u8(&decoded, "mint_decimals"),
        })
    }
}

impl BuyerState {
    pub fn decode(schema: &Schema, data: &[u8]) -> Result<Self, CodecError> {
        let def = schema
            .accounts
            .iter()
            .find(|a| a.name == "BuyerState")
            .expect("BuyerState layout present in schema");
        let decoded = decode_account_as(def, data)?;
        Ok(Self {
            whitelisted: get_bool(&decoded, "whitelisted"),
            total_tokens: get_u64(&decoded, "total_tokens"),
            holding_since: get_i64(&decoded, "holding_since"),
            last_sell_at: get_i64(&decoded, "last_sell_at"),
            last_reward_claim_at: get_i64(&decoded, "last_reward_claim_at"),
        })
    }

    /// `holding_since == 0` means this wallet never purchased; hold-period
    /// guarded actions are ineligible until the program sets it.
    pub fn has_purchased(&self) -> bool {
        self.holding_since != 0
    }
}

fn get_u8(acc: &DecodedAccount, name: &str) -> u8 {
    match acc.field(name) {
        Some(Value::U8(v)) => *v,
        _ => 0,
    }
}

fn get_u64(acc: &DecodedAccount, name: &str) -> u64 {
    match acc.field(name) {
        Some(Value::U64(v)) => *v,
        _ => 0,
    }
}

fn get_i64(acc: &DecodedAccount, name: &str) -> i64 {
    match acc.field(name) {
        Some(Value::I64(v)) => *v,
        _ => 0,
    }
}

fn get_bool(acc: &DecodedAccount, name: &str) -> bool {
    match acc.field(name) {
        Some(Value::Bool(v)) => *v,
        _ => false,
    }
}

fn get_pubkey(acc: &DecodedAccount, name: &str) -> Pubkey {
    match acc.field(name) {
        Some(Value::Pubkey(v)) => *v,
        _ => Pubkey::default(),
    }
}
