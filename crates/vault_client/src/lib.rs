mod amount;
mod assembler;
mod config;
mod error;
mod feed;
mod reader;
mod wallet;

pub use amount::{parse_sol_amount, parse_ui_amount, NATIVE_DECIMALS};
pub use assembler::{
    min_out_bound, sign_and_submit, AccountSnapshot, Assembler, Intent, TransactionPlan,
    DEFAULT_SLIPPAGE_PCT, MAX_SLIPPAGE_PCT,
};
pub use config::{
    ProgramConfig, DEFAULT_FOUNDER, DEFAULT_MINT, DEFAULT_PROGRAM_ID, DEFAULT_TREASURY,
};
pub use error::ClientError;
pub use feed::{fetch_events, FeedEvent};
pub use pda_util::parse_address;
pub use reader::VaultReader;
pub use wallet::{WalletEvent, WalletSession, WalletState};

#[cfg(test)]
mod tests {
    use solana_sdk::pubkey::Pubkey;
    use vault_codec::{BuyerState, VaultConfig};

    use super::*;

    fn assembler() -> Assembler {
        Assembler::new(ProgramConfig::mainnet())
    }

    fn vault_config(decimals: u8, price: u64) -> VaultConfig {
        VaultConfig {
            owner: Pubkey::new_unique(),
            total_supply: 150_000_000,
            presale_sold: 0,
            manual_price_lamports_per_10k: price,
            public_sale_active: true,
            mint: Pubkey::new_unique(),
            mint_decimals: decimals,
        }
    }

    fn eligible_buyer() -> BuyerState {
        BuyerState {
            whitelisted: true,
            total_tokens: 1_000,
            holding_since: 1_700_000_000,
            last_sell_at: 0,
            last_reward_claim_at: 0,
        }
    }

    fn fresh_snapshot() -> AccountSnapshot {
        AccountSnapshot {
            vault: Some(vault_config(9, 50_000_000)),
            buyer: None,
            buyer_holding_exists: false,
            vault_holding_exists: false,
        }
    }

    #[test]
    fn fresh_wallet_purchase_plans_two_creations_then_buy() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let plan = asm
            .plan(
                &wallet,
                &Intent::Purchase { lamports: 1_500_000_000 },
                &fresh_snapshot(),
            )
            .unwrap();

        assert_eq!(plan.instructions.len(), 3);
        assert_eq!(plan.fee_payer, wallet);

        let ata_program = spl_associated_token_account::id();
        assert_eq!(plan.instructions[0].program_id, ata_program);
        assert_eq!(plan.instructions[1].program_id, ata_program);
        assert_eq!(plan.instructions[2].program_id, asm.config().program_id);

        // Buyer's holding account first, then the vault's; payer is the
        // acting wallet on both.
        assert_eq!(plan.instructions[0].accounts[0].pubkey, wallet);
        assert_eq!(
            plan.instructions[0].accounts[1].pubkey,
            asm.config().holding(&wallet)
        );
        assert_eq!(plan.instructions[1].accounts[0].pubkey, wallet);
        assert_eq!(
            plan.instructions[1].accounts[1].pubkey,
            asm.config().vault_holding()
        );

        // The acting wallet is the only signer anywhere in the plan.
        let signers: Vec<Pubkey> = plan
            .instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter())
            .filter(|meta| meta.is_signer)
            .map(|meta| meta.pubkey)
            .collect();
        assert!(!signers.is_empty());
        assert!(signers.iter().all(|pk| *pk == wallet));
    }

    #[test]
    fn existing_holdings_skip_creation_steps() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let snap = AccountSnapshot {
            buyer_holding_exists: true,
            vault_holding_exists: true,
            ..fresh_snapshot()
        };
        let plan = asm
            .plan(&wallet, &Intent::Purchase { lamports: 1 }, &snap)
            .unwrap();
        assert_eq!(plan.instructions.len(), 1);
    }

    #[test]
    fn zero_amount_is_rejected_not_submitted() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let err = asm
            .plan(&wallet, &Intent::Purchase { lamports: 0 }, &fresh_snapshot())
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn claim_without_purchase_is_rejected_locally() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let snap = AccountSnapshot {
            buyer: Some(BuyerState {
                holding_since: 0,
                ..eligible_buyer()
            }),
            ..fresh_snapshot()
        };
        let err = asm.plan(&wallet, &Intent::Claim, &snap).unwrap_err();
        assert!(matches!(err, ClientError::Ineligible(_)));
    }

    #[test]
    fn claim_without_whitelist_is_rejected_locally() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let snap = AccountSnapshot {
            buyer: Some(BuyerState {
                whitelisted: false,
                ..eligible_buyer()
            }),
            ..fresh_snapshot()
        };
        let err = asm.plan(&wallet, &Intent::Claim, &snap).unwrap_err();
        assert!(matches!(err, ClientError::Ineligible(_)));
    }

    #[test]
    fn claim_for_unknown_buyer_is_rejected_locally() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let err = asm
            .plan(&wallet, &Intent::Claim, &fresh_snapshot())
            .unwrap_err();
        assert!(matches!(err, ClientError::Ineligible(_)));
    }

    #[test]
    fn swap_out_with_zero_holding_since_never_builds() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let snap = AccountSnapshot {
            buyer: Some(BuyerState {
                holding_since: 0,
                ..eligible_buyer()
            }),
            ..fresh_snapshot()
        };
        let err = asm
            .plan(
                &wallet,
                &Intent::SwapOut { tokens: 1_000, slippage_pct: None },
                &snap,
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::Ineligible(_)));
    }

    #[test]
    fn swap_in_encodes_a_protected_min_out() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let snap = AccountSnapshot {
            buyer_holding_exists: true,
            vault_holding_exists: true,
            ..fresh_snapshot()
        };
        // 1.5 SOL at 0.05 SOL per 10k tokens, 9 decimals, 1% slippage:
        // expected = 1.5e9 * 1e4 * 1e9 / 5e7 = 3e14 base units.
        let plan = asm
            .plan(
                &wallet,
                &Intent::SwapIn { lamports: 1_500_000_000, slippage_pct: Some(1.0) },
                &snap,
            )
            .unwrap();
        assert_eq!(plan.instructions.len(), 1);
        let data = &plan.instructions[0].data;
        let min_out = u64::from_le_bytes(data[16..24].try_into().unwrap());
        assert_eq!(min_out, 297_000_000_000_000); // 3e14 * 0.99
    }

    #[test]
    fn slippage_is_clamped_and_never_zeroes_the_bound() {
        assert_eq!(min_out_bound(1_000_000, Some(0.0)), 1_000_000);
        // Outside [0, 50] clamps rather than rejects.
        assert_eq!(min_out_bound(1_000_000, Some(99.0)), 500_000);
        assert_eq!(min_out_bound(1_000_000, Some(-3.0)), 1_000_000);
        // Non-numeric input falls back to the default, not to zero.
        assert_eq!(
            min_out_bound(1_000_000, Some(f64::NAN)),
            min_out_bound(1_000_000, None)
        );
        assert!(min_out_bound(1_000_000, None) > 0);
        // Even a dust-sized expected output keeps a nonzero bound.
        assert_eq!(min_out_bound(1, Some(50.0)), 1);
    }

    #[test]
    fn sell_refuses_for_missing_treasury_cosigner() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let snap = AccountSnapshot {
            buyer: Some(eligible_buyer()),
            ..fresh_snapshot()
        };
        let err = asm
            .plan(&wallet, &Intent::Sell { tokens: 100 }, &snap)
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingCosigner("treasury")));
    }

    #[test]
    fn founder_operations_require_the_founder_wallet() {
        let asm = assembler();
        let outsider = Pubkey::new_unique();
        let err = asm
            .plan(
                &outsider,
                &Intent::SetManualPrice { lamports_per_10k: 1 },
                &fresh_snapshot(),
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::Ineligible(_)));

        let founder = asm.config().founder;
        let plan = asm
            .plan(
                &founder,
                &Intent::SetManualPrice { lamports_per_10k: 60_000_000 },
                &fresh_snapshot(),
            )
            .unwrap();
        assert_eq!(plan.instructions.len(), 1);
        assert_eq!(plan.fee_payer, founder);
    }

    #[test]
    fn self_whitelist_needs_no_holding_accounts() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let plan = asm
            .plan(&wallet, &Intent::SelfWhitelist, &AccountSnapshot::default())
            .unwrap();
        assert_eq!(plan.instructions.len(), 1);
        // buyer is the third account and must sign.
        let meta = &plan.instructions[0].accounts[2];
        assert_eq!(meta.pubkey, wallet);
        assert!(meta.is_signer);
    }

    #[test]
    fn swap_uses_on_chain_decimals_not_a_guess() {
        let asm = assembler();
        let wallet = Pubkey::new_unique();
        let mut snap = AccountSnapshot {
            buyer_holding_exists: true,
            vault_holding_exists: true,
            ..fresh_snapshot()
        };
        snap.vault = Some(vault_config(6, 50_000_000));
        let plan = asm
            .plan(
                &wallet,
                &Intent::SwapIn { lamports: 1_500_000_000, slippage_pct: Some(1.0) },
                &snap,
            )
            .unwrap();
        let data = &plan.instructions[0].data;
        let min_out = u64::from_le_bytes(data[16..24].try_into().unwrap());
        // Same trade at 6 decimals is a factor 1000 smaller.
        assert_eq!(min_out, 297_000_000_000);
    }
}
