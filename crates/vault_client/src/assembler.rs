//! Builds signable transactions from user intents. Planning is pure: it maps
//! an intent plus a snapshot of just-read chain state to an ordered
//! instruction list. All I/O (reads, blockhash, signing, submission) happens
//! around it, never inside it.

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::Signer;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::instruction::create_associated_token_account;
use tracing::info;
use vault_codec::{dmd_schema, encode_instruction, BuyerState, CodecError, Schema, Value, VaultConfig};

use crate::config::ProgramConfig;
use crate::error::ClientError;

/// Slippage applied when the user supplies none; keeps the minimum-output
/// bound nonzero so a swap never goes out with no price protection.
pub const DEFAULT_SLIPPAGE_PCT: f64 = 0.5;
pub const MAX_SLIPPAGE_PCT: f64 = 50.0;

const TOKENS_PER_PRICE_ANCHOR: u128 = 10_000;

/// What the user asked for. Amounts are base units, already validated by
/// the amount parser.
#[derive(Debug, Clone)]
pub enum Intent {
    Purchase { lamports: u64 },
    Claim,
    SwapIn { lamports: u64, slippage_pct: Option<f64> },
    SwapOut { tokens: u64, slippage_pct: Option<f64> },
    /// Requires the treasury to co-sign; kept for completeness, always
    /// refused client-side.
    Sell { tokens: u64 },
    SelfWhitelist,
    Initialize { initial_price_lamports: u64 },
    TogglePublicSale { active: bool },
    WhitelistAdd { wallet: Pubkey, status: bool },
    SetManualPrice { lamports_per_10k: u64 },
}

/// Chain state read immediately before planning. Fields are observations,
/// valid only for the decision at hand; the next action re-reads.
#[derive(Debug, Clone, Default)]
pub struct AccountSnapshot {
    pub vault: Option<VaultConfig>,
    pub buyer: Option<BuyerState>,
    pub buyer_holding_exists: bool,
    pub vault_holding_exists: bool,
}

/// An ordered, signable instruction list. Constructed per action and
/// discarded; a retry starts from a fresh snapshot.
#[derive(Debug)]
pub struct TransactionPlan {
    pub instructions: Vec<Instruction>,
    pub fee_payer: Pubkey,
}

pub struct Assembler {
    cfg: ProgramConfig,
    schema: Schema,
}

impl Assembler {
    pub fn new(cfg: ProgramConfig) -> Self {
        Self {
            cfg,
            schema: dmd_schema(),
        }
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.cfg
    }

    /// Maps an intent to its instruction list against the given snapshot.
    pub fn plan(
        &self,
        wallet: &Pubkey,
        intent: &Intent,
        snap: &AccountSnapshot,
    ) -> Result<TransactionPlan, ClientError> {
        let mut instructions = Vec::new();

        match intent {
            Intent::Purchase { lamports } => {
                require_positive(*lamports)?;
                self.push_holding_creations(wallet, snap, &mut instructions);
                instructions.push(self.instruction(
                    "buy_dmd",
                    &self.trading_bindings(wallet),
                    &[("sol_contribution", Value::U64(*lamports))],
                )?);
            }
            Intent::Claim => {
                let buyer = require_buyer(snap)?;
                if !buyer.whitelisted {
                    return Err(ClientError::Ineligible("wallet is not whitelisted".into()));
                }
                if !buyer.has_purchased() {
                    return Err(ClientError::Ineligible(
                        "no purchase on record; the holding period has never started".into(),
                    ));
                }
                self.push_holding_creations(wallet, snap, &mut instructions);
                instructions.push(self.instruction(
                    "claim_reward_v2",
                    &self.trading_bindings(wallet),
                    &[],
                )?);
            }
            Intent::SwapIn { lamports, slippage_pct } => {
                require_positive(*lamports)?;
                let vault = require_vault(snap)?;
                let expected = expected_tokens_out(*lamports, vault)?;
                let min_out = min_out_bound(expected, *slippage_pct);
                self.push_holding_creations(wallet, snap, &mut instructions);
                instructions.push(self.instruction(
                    "swap_exact_sol_for_dmd",
                    &self.trading_bindings(wallet),
                    &[
                        ("amount_in_lamports", Value::U64(*lamports)),
                        ("min_out_dmd", Value::U64(min_out)),
                    ],
                )?);
            }
            Intent::SwapOut { tokens, slippage_pct } => {
                require_positive(*tokens)?;
                let vault = require_vault(snap)?;
                let buyer = require_buyer(snap)?;
                if !buyer.whitelisted {
                    return Err(ClientError::Ineligible("wallet is not whitelisted".into()));
                }
                if !buyer.has_purchased() {
                    return Err(ClientError::Ineligible(
                        "no purchase on record; the holding period has never started".into(),
                    ));
                }
                let expected = expected_lamports_out(*tokens, vault)?;
                let min_out = min_out_bound(expected, *slippage_pct);
                self.push_holding_creations(wallet, snap, &mut instructions);
                instructions.push(self.instruction(
                    "swap_exact_dmd_for_sol",
                    &self.trading_bindings(wallet),
                    &[
                        ("amount_in_dmd", Value::U64(*tokens)),
                        ("min_out_sol", Value::U64(min_out)),
                    ],
                )?);
            }
            Intent::Sell { .. } => {
                // The program's sell path lists the treasury as writable and
                // signer; a client holding only the buyer's key cannot
                // produce that signature, so refuse instead of submitting a
                // transaction doomed to an opaque rejection.
                return Err(ClientError::MissingCosigner("treasury"));
            }
            Intent::SelfWhitelist => {
                instructions.push(self.instruction(
                    "auto_whitelist_self",
                    &[
                        ("vault", self.cfg.vault()),
                        ("buyer_state", self.cfg.buyer_state(wallet)),
                        ("buyer", *wallet),
                        ("system_program", system_program::id()),
                    ],
                    &[],
                )?);
            }
            Intent::Initialize { initial_price_lamports } => {
                self.require_founder(wallet)?;
                instructions.push(self.instruction(
                    "initialize",
                    &[
                        ("vault", self.cfg.vault()),
                        ("buyer_state", self.cfg.buyer_state(wallet)),
                        ("founder", self.cfg.founder),
                        ("mint", self.cfg.mint),
                        ("founder_holding", self.cfg.holding(&self.cfg.founder)),
                        ("token_program", spl_token::id()),
                        ("system_program", system_program::id()),
                    ],
                    &[("initial_price_sol", Value::U64(*initial_price_lamports))],
                )?);
            }
            Intent::TogglePublicSale { active } => {
                self.require_founder(wallet)?;
                instructions.push(self.instruction(
                    "toggle_public_sale",
                    &[("vault", self.cfg.vault()), ("founder", self.cfg.founder)],
                    &[("active", Value::Bool(*active))],
                )?);
            }
            Intent::WhitelistAdd { wallet: target, status } => {
                self.require_founder(wallet)?;
                instructions.push(self.instruction(
                    "whitelist_add",
                    &[
                        ("vault", self.cfg.vault()),
                        ("buyer", *target),
                        ("buyer_state", self.cfg.buyer_state(target)),
                        ("founder", self.cfg.founder),
                        ("system_program", system_program::id()),
                    ],
                    &[("status", Value::Bool(*status))],
                )?);
            }
            Intent::SetManualPrice { lamports_per_10k } => {
                self.require_founder(wallet)?;
                require_positive(*lamports_per_10k)?;
                instructions.push(self.instruction(
                    "set_manual_price",
                    &[("vault", self.cfg.vault()), ("founder", self.cfg.founder)],
                    &[("lamports_per_10k", Value::U64(*lamports_per_10k))],
                )?);
            }
        }

        Ok(TransactionPlan {
            instructions,
            fee_payer: *wallet,
        })
    }

    /// Idempotent create-if-absent steps for the two holding accounts a
    /// trade touches, ordered ahead of the main instruction. The acting
    /// wallet pays for both.
    fn push_holding_creations(
        &self,
        wallet: &Pubkey,
        snap: &AccountSnapshot,
        instructions: &mut Vec<Instruction>,
    ) {
        if !snap.buyer_holding_exists {
            instructions.push(create_associated_token_account(
                wallet,
                wallet,
                &self.cfg.mint,
                &spl_token::id(),
            ));
        }
        if !snap.vault_holding_exists {
            instructions.push(create_associated_token_account(
                wallet,
                &self.cfg.vault(),
                &self.cfg.mint,
                &spl_token::id(),
            ));
        }
    }

    /// Account bindings shared by the buy/claim/swap family.
    fn trading_bindings(&self, wallet: &Pubkey) -> Vec<(&'static str, Pubkey)> {
        vec![
            ("vault", self.cfg.vault()),
            ("buyer_state", self.cfg.buyer_state(wallet)),
            ("founder", self.cfg.founder),
            ("treasury", self.cfg.treasury),
            ("vault_holding", self.cfg.vault_holding()),
            ("buyer_holding", self.cfg.holding(wallet)),
            ("buyer", *wallet),
            ("token_program", spl_token::id()),
            ("system_program", system_program::id()),
        ]
    }

    /// Materializes one schema operation: payload from the codec, account
    /// metas in the schema's order with the schema's flags. A missing
    /// binding is a config error and fails loudly.
    fn instruction(
        &self,
        op: &str,
        bindings: &[(&'static str, Pubkey)],
        args: &[(&str, Value)],
    ) -> Result<Instruction, ClientError> {
        let def = self
            .schema
            .operation(op)
            .ok_or_else(|| CodecError::SchemaMismatch(format!("unknown operation `{op}`")))?;
        let data = encode_instruction(&self.schema, op, args)?;
        let accounts = def
            .accounts
            .iter()
            .map(|slot| {
                let pubkey = bindings
                    .iter()
                    .find(|(name, _)| *name == slot.name)
                    .map(|(_, pk)| *pk)
                    .ok_or_else(|| {
                        CodecError::SchemaMismatch(format!(
                            "no binding for account `{}` of `{op}`",
                            slot.name
                        ))
                    })?;
                Ok(AccountMeta {
                    pubkey,
                    is_signer: slot.signer,
                    is_writable: slot.writable,
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;
        Ok(Instruction {
            program_id: self.cfg.program_id,
            accounts,
            data,
        })
    }

    fn require_founder(&self, wallet: &Pubkey) -> Result<(), ClientError> {
        if *wallet != self.cfg.founder {
            return Err(ClientError::Ineligible(
                "only the founder wallet can run this operation".into(),
            ));
        }
        Ok(())
    }
}

/// Attaches the freshest blockhash, signs with the acting wallet as fee
/// payer and sole signer, and submits. Rejections come back verbatim inside
/// `SubmissionFailed`; there is no automatic retry, since the failed
/// precondition lives on chain and must be re-read first.
pub async fn sign_and_submit(
    rpc: &RpcClient,
    plan: &TransactionPlan,
    signer: &dyn Signer,
) -> Result<Signature, ClientError> {
    let blockhash = rpc
        .get_latest_blockhash()
        .await
        .map_err(|e| ClientError::Rpc(format!("failed to get latest blockhash: {e}")))?;
    let signers: Vec<&dyn Signer> = vec![signer];
    let tx = Transaction::new_signed_with_payer(
        &plan.instructions,
        Some(&plan.fee_payer),
        &signers,
        blockhash,
    );
    let signature = rpc
        .send_and_confirm_transaction(&tx)
        .await
        .map_err(|e| ClientError::SubmissionFailed(e.to_string()))?;
    info!(%signature, "transaction submitted");
    Ok(signature)
}

fn require_positive(amount: u64) -> Result<(), ClientError> {
    if amount == 0 {
        return Err(ClientError::InvalidInput("amount must be positive".into()));
    }
    Ok(())
}

fn require_vault(snap: &AccountSnapshot) -> Result<&VaultConfig, ClientError> {
    snap.vault
        .as_ref()
        .ok_or_else(|| ClientError::Ineligible("vault is not initialized".into()))
}

fn require_buyer(snap: &AccountSnapshot) -> Result<&BuyerState, ClientError> {
    snap.buyer
        .as_ref()
        .ok_or_else(|| ClientError::Ineligible("wallet has never interacted with the program".into()))
}

fn token_scale(vault: &VaultConfig) -> Result<u128, ClientError> {
    if vault.mint_decimals > 19 {
        return Err(ClientError::Ineligible(format!(
            "implausible on-chain decimal scale {}",
            vault.mint_decimals
        )));
    }
    Ok(10u128.pow(vault.mint_decimals as u32))
}

/// Expected token base units for `lamports` at the on-chain manual price.
fn expected_tokens_out(lamports: u64, vault: &VaultConfig) -> Result<u64, ClientError> {
    if vault.manual_price_lamports_per_10k == 0 {
        return Err(ClientError::Ineligible("manual price is not set on chain".into()));
    }
    let scale = token_scale(vault)?;
    let out = (lamports as u128)
        .checked_mul(TOKENS_PER_PRICE_ANCHOR)
        .and_then(|v| v.checked_mul(scale))
        .map(|v| v / vault.manual_price_lamports_per_10k as u128)
        .ok_or_else(|| ClientError::InvalidInput("amount is too large".into()))?;
    u64::try_from(out).map_err(|_| ClientError::InvalidInput("amount is too large".into()))
}

/// Expected lamports for `tokens` base units at the on-chain manual price.
fn expected_lamports_out(tokens: u64, vault: &VaultConfig) -> Result<u64, ClientError> {
    if vault.manual_price_lamports_per_10k == 0 {
        return Err(ClientError::Ineligible("manual price is not set on chain".into()));
    }
    let scale = token_scale(vault)?;
    let out = (tokens as u128)
        .checked_mul(vault.manual_price_lamports_per_10k as u128)
        .map(|v| v / (TOKENS_PER_PRICE_ANCHOR * scale))
        .ok_or_else(|| ClientError::InvalidInput("amount is too large".into()))?;
    u64::try_from(out).map_err(|_| ClientError::InvalidInput("amount is too large".into()))
}

/// Minimum acceptable output: expected × (1 − slippage), slippage clamped to
/// `[0, 50]`% and defaulted when absent or non-numeric. Integer math, floored,
/// but never zero: a zero bound would disable price protection entirely.
pub fn min_out_bound(expected: u64, slippage_pct: Option<f64>) -> u64 {
    let pct = slippage_pct
        .filter(|p| p.is_finite())
        .unwrap_or(DEFAULT_SLIPPAGE_PCT)
        .clamp(0.0, MAX_SLIPPAGE_PCT);
    let bps = (pct * 100.0).round() as u128;
    let bound = expected as u128 * (10_000 - bps) / 10_000;
    (bound as u64).max(1)
}
