//! The program's wire contract as data: operation names, argument layouts,
//! account role orderings, and account byte layouts all live here, not in the
//! call sites. Any layout change on the program side is a change to this file.

use sha2::{Digest, Sha256};

/// Field types the program's binary layouts use. 64-bit quantities stay
/// byte-exact integers end to end; there is no float anywhere in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U64,
    I64,
    Bool,
    Pubkey,
}

impl FieldKind {
    pub fn byte_len(self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::Bool => 1,
            FieldKind::U64 | FieldKind::I64 => 8,
            FieldKind::Pubkey => 32,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// One slot in an operation's fixed account list. Order, writability and
/// signer-ness must match the program exactly; a deviation produces an opaque
/// on-chain rejection.
#[derive(Debug, Clone, Copy)]
pub struct AccountSlot {
    pub name: &'static str,
    pub writable: bool,
    pub signer: bool,
}

#[derive(Debug, Clone)]
pub struct OperationDef {
    pub name: &'static str,
    pub discriminator: [u8; 8],
    pub args: Vec<FieldDef>,
    pub accounts: Vec<AccountSlot>,
}

#[derive(Debug, Clone)]
pub struct AccountDef {
    pub name: &'static str,
    pub discriminator: [u8; 8],
    pub fields: Vec<FieldDef>,
    /// Number of trailing fields that may be absent in accounts written by
    /// older program versions; they decode to zero/false defaults.
    pub optional_tail: usize,
}

impl AccountDef {
    /// Discriminator plus every required field.
    pub fn min_len(&self) -> usize {
        let required = self.fields.len() - self.optional_tail;
        8 + self.fields[..required]
            .iter()
            .map(|f| f.kind.byte_len())
            .sum::<usize>()
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub operations: Vec<OperationDef>,
    pub accounts: Vec<AccountDef>,
}

impl Schema {
    pub fn operation(&self, name: &str) -> Option<&OperationDef> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn operation_by_discriminator(&self, disc: &[u8; 8]) -> Option<&OperationDef> {
        self.operations.iter().find(|op| &op.discriminator == disc)
    }

    pub fn account_by_discriminator(&self, disc: &[u8; 8]) -> Option<&AccountDef> {
        self.accounts.iter().find(|acc| &acc.discriminator == disc)
    }
}

/// Anchor-style 8-byte discriminator: `sha256("<namespace>:<name>")[..8]`.
pub fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

fn op(name: &'static str, args: Vec<FieldDef>, accounts: Vec<AccountSlot>) -> OperationDef {
    OperationDef {
        name,
        discriminator: discriminator("global", name),
        args,
        accounts,
    }
}

fn field(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, kind }
}

fn w(name: &'static str) -> AccountSlot {
    AccountSlot { name, writable: true, signer: false }
}

fn ws(name: &'static str) -> AccountSlot {
    AccountSlot { name, writable: true, signer: true }
}

fn r(name: &'static str) -> AccountSlot {
    AccountSlot { name, writable: false, signer: false }
}

fn rs(name: &'static str) -> AccountSlot {
    AccountSlot { name, writable: false, signer: true }
}

/// The DMD vault program surface.
pub fn dmd_schema() -> Schema {
    let operations = vec![
        op(
            "initialize",
            vec![field("initial_price_sol", FieldKind::U64)],
            vec![
                w("vault"),
                w("buyer_state"),
                ws("founder"),
                w("mint"),
                w("founder_holding"),
                r("token_program"),
                r("system_program"),
            ],
        ),
        op(
            "toggle_public_sale",
            vec![field("active", FieldKind::Bool)],
            vec![w("vault"), ws("founder")],
        ),
        op(
            "whitelist_add",
            vec![field("status", FieldKind::Bool)],
            vec![
                w("vault"),
                r("buyer"),
                w("buyer_state"),
                ws("founder"),
                r("system_program"),
            ],
        ),
        op(
            "set_manual_price",
            vec![field("lamports_per_10k", FieldKind::U64)],
            vec![w("vault"), rs("founder")],
        ),
        op(
            "auto_whitelist_self",
            vec![],
            vec![
                w("vault"),
                w("buyer_state"),
                ws("buyer"),
                r("system_program"),
            ],
        ),
        op(
            "buy_dmd",
            vec![field("sol_contribution", FieldKind::U64)],
            vec![
                w("vault"),
                w("buyer_state"),
                w("founder"),
                w("treasury"),
                w("vault_holding"),
                w("buyer_holding"),
                ws("buyer"),
                r("token_program"),
                r("system_program"),
            ],
        ),
        op(
            "claim_reward_v2",
            vec![],
            vec![
                w("vault"),
                w("buyer_state"),
                w("vault_holding"),
                w("buyer_holding"),
                rs("buyer"),
                r("token_program"),
            ],
        ),
        op(
            "swap_exact_sol_for_dmd",
            vec![
                field("amount_in_lamports", FieldKind::U64),
                field("min_out_dmd", FieldKind::U64),
            ],
            vec![
                w("vault"),
                w("buyer_state"),
                w("vault_holding"),
                w("buyer_holding"),
                w("founder"),
                w("treasury"),
                ws("buyer"),
                r("token_program"),
                r("system_program"),
            ],
        ),
        op(
            "swap_exact_dmd_for_sol",
            vec![
                field("amount_in_dmd", FieldKind::U64),
                field("min_out_sol", FieldKind::U64),
            ],
            vec![
                w("vault"),
                w("buyer_state"),
                w("vault_holding"),
                w("buyer_holding"),
                w("treasury"),
                w("founder"),
                ws("buyer"),
                r("token_program"),
                r("system_program"),
            ],
        ),
        // The treasury is a second signer here; see the assembler for why a
        // pure client refuses to build this one.
        op(
            "sell_dmd_v2",
            vec![field("amount_tokens", FieldKind::U64)],
            vec![
                w("vault"),
                w("buyer_state"),
                w("vault_holding"),
                w("buyer_holding"),
                ws("treasury"),
                w("founder"),
                ws("buyer"),
                r("token_program"),
                r("system_program"),
            ],
        ),
    ];

    let accounts = vec![
        AccountDef {
            name: "VaultConfig",
            discriminator: discriminator("account", "VaultConfig"),
            fields: vec![
                field("owner", FieldKind::Pubkey),
                field("total_supply", FieldKind::U64),
                field("presale_sold", FieldKind::U64),
                field("manual_price_lamports_per_10k", FieldKind::U64),
                field("public_sale_active", FieldKind::Bool),
                field("mint", FieldKind::Pubkey),
                field("mint_decimals", FieldKind::U8),
            ],
            optional_tail: 0,
        },
        AccountDef {
            name: "BuyerState",
            discriminator: discriminator("account", "BuyerState"),
            fields: vec![
                field("whitelisted", FieldKind::Bool),
                field("total_tokens", FieldKind::U64),
                field("holding_since", FieldKind::I64),
                field("last_sell_at", FieldKind::I64),
                // v2-only; absent in accounts written before the reward rework.
                field("last_reward_claim_at", FieldKind::I64),
            ],
            optional_tail: 1,
        },
    ];

    Schema { operations, accounts }
}
