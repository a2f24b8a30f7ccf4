mod codec;
mod error;
mod schema;
mod state;

pub use codec::{
    decode_account, decode_account_as, decode_instruction, encode_instruction, DecodedAccount,
    Value,
};
pub use error::CodecError;
pub use schema::{
    discriminator, dmd_schema, AccountDef, AccountSlot, FieldDef, FieldKind, OperationDef, Schema,
};
pub use state::{BuyerState, VaultConfig};

#[cfg(test)]
mod tests {
    use solana_sdk::pubkey::Pubkey;

    use super::*;

    fn encode_vault_bytes(cfg: &VaultConfig) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&discriminator("account", "VaultConfig"));
        data.extend_from_slice(cfg.owner.as_ref());
        data.extend_from_slice(&cfg.total_supply.to_le_bytes());
        data.extend_from_slice(&cfg.presale_sold.to_le_bytes());
        data.extend_from_slice(&cfg.manual_price_lamports_per_10k.to_le_bytes());
        data.push(u8::from(cfg.public_sale_active));
        data.extend_from_slice(cfg.mint.as_ref());
        data.push(cfg.mint_decimals);
        data
    }

    #[test]
    fn instruction_round_trips() {
        let schema = dmd_schema();
        let args = vec![
            ("amount_in_lamports", Value::U64(1_500_000_000)),
            ("min_out_dmd", Value::U64(14_850_000_000_000)),
        ];
        let data = encode_instruction(&schema, "swap_exact_sol_for_dmd", &args).unwrap();
        let (name, decoded) = decode_instruction(&schema, &data).unwrap();
        assert_eq!(name, "swap_exact_sol_for_dmd");
        assert_eq!(decoded, args);
    }

    #[test]
    fn empty_arg_operations_round_trip() {
        let schema = dmd_schema();
        let data = encode_instruction(&schema, "claim_reward_v2", &[]).unwrap();
        assert_eq!(data.len(), 8);
        let (name, decoded) = decode_instruction(&schema, &data).unwrap();
        assert_eq!(name, "claim_reward_v2");
        assert!(decoded.is_empty());
    }

    #[test]
    fn unknown_operation_is_schema_mismatch() {
        let schema = dmd_schema();
        let err = encode_instruction(&schema, "burn_dmd", &[]).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch(_)));
    }

    #[test]
    fn wrong_argument_type_is_schema_mismatch() {
        let schema = dmd_schema();
        let err = encode_instruction(&schema, "buy_dmd", &[("sol_contribution", Value::Bool(true))])
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch(_)));
    }

    #[test]
    fn missing_and_extra_arguments_are_schema_mismatch() {
        let schema = dmd_schema();
        assert!(matches!(
            encode_instruction(&schema, "buy_dmd", &[]),
            Err(CodecError::SchemaMismatch(_))
        ));
        assert!(matches!(
            encode_instruction(
                &schema,
                "toggle_public_sale",
                &[("active", Value::Bool(true)), ("extra", Value::U64(1))]
            ),
            Err(CodecError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn vault_config_decodes_field_exact() {
        let schema = dmd_schema();
        let cfg = VaultConfig {
            owner: Pubkey::new_unique(),
            total_supply: 150_000_000,
            presale_sold: 12_345_678,
            manual_price_lamports_per_10k: 50_000_000,
            public_sale_active: true,
            mint: Pubkey::new_unique(),
            mint_decimals: 9,
        };
        let decoded = VaultConfig::decode(&schema, &encode_vault_bytes(&cfg)).unwrap();
        assert_eq!(decoded, cfg);
    }

    #[test]
    fn short_buffer_is_truncated_data_at_every_length() {
        let schema = dmd_schema();
        let cfg = VaultConfig {
            owner: Pubkey::new_unique(),
            total_supply: 1,
            presale_sold: 0,
            manual_price_lamports_per_10k: 1,
            public_sale_active: false,
            mint: Pubkey::new_unique(),
            mint_decimals: 6,
        };
        let full = encode_vault_bytes(&cfg);
        for cut in 0..full.len() {
            let err = VaultConfig::decode(&schema, &full[..cut]).unwrap_err();
            assert!(
                matches!(err, CodecError::TruncatedData { .. }),
                "cut={cut} gave {err:?}"
            );
        }
    }

    #[test]
    fn unknown_discriminator_is_refused() {
        let schema = dmd_schema();
        let mut data = vec![0u8; 98];
        data[..8].copy_from_slice(&discriminator("account", "SomethingElse"));
        let err = decode_account(&schema, &data).unwrap_err();
        assert!(matches!(err, CodecError::UnknownDiscriminator(_)));
    }

    #[test]
    fn v1_buyer_state_defaults_missing_claim_timestamp() {
        let schema = dmd_schema();
        let mut data = Vec::new();
        data.extend_from_slice(&discriminator("account", "BuyerState"));
        data.push(1); // whitelisted
        data.extend_from_slice(&777u64.to_le_bytes()); // total_tokens
        data.extend_from_slice(&1_700_000_000i64.to_le_bytes()); // holding_since
        data.extend_from_slice(&0i64.to_le_bytes()); // last_sell_at
        // no last_reward_claim_at: account written by the v1 program

        let state = BuyerState::decode(&schema, &data).unwrap();
        assert!(state.whitelisted);
        assert_eq!(state.total_tokens, 777);
        assert_eq!(state.holding_since, 1_700_000_000);
        assert_eq!(state.last_reward_claim_at, 0);
        assert!(state.has_purchased());
    }

    #[test]
    fn u64_values_survive_beyond_f64_precision() {
        // 2^63 + 1 is not representable as f64; the codec must carry it
        // byte-exact.
        let schema = dmd_schema();
        let huge = (1u64 << 63) + 1;
        let data =
            encode_instruction(&schema, "buy_dmd", &[("sol_contribution", Value::U64(huge))])
                .unwrap();
        let (_, args) = decode_instruction(&schema, &data).unwrap();
        assert_eq!(args, vec![("sol_contribution", Value::U64(huge))]);
    }

    #[test]
    fn operation_discriminators_are_distinct() {
        let schema = dmd_schema();
        for a in &schema.operations {
            for b in &schema.operations {
                if a.name != b.name {
                    assert_ne!(a.discriminator, b.discriminator);
                }
            }
        }
    }
}
