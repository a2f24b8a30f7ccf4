use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use thiserror::Error;

/// Namespace seed of the vault configuration account.
pub const VAULT_SEED: &[u8] = b"vault";
/// Namespace seed of the per-wallet buyer state account.
pub const BUYER_SEED: &[u8] = b"buyer";

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("malformed address `{0}`")]
    Malformed(String),
}

/// Parses a base58 address, surfacing bad input as a typed error.
pub fn parse_address(s: &str) -> Result<Pubkey, AddressError> {
    Pubkey::from_str(s.trim()).map_err(|_| AddressError::Malformed(s.to_string()))
}

/// Program-derived address of the vault configuration account.
pub fn vault_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[VAULT_SEED], program_id).0
}

/// Program-derived address of the buyer state for `wallet` under `vault`.
pub fn buyer_state_address(program_id: &Pubkey, vault: &Pubkey, wallet: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[BUYER_SEED, vault.as_ref(), wallet.as_ref()],
        program_id,
    )
    .0
}

/// Canonical associated holding account for `(owner, mint)`. Works for
/// off-curve owners (the vault PDA holds its tokens this way too).
pub fn holding_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(owner, mint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_id() -> Pubkey {
        parse_address("EDY4bp4fXWkAJpJhXUMZLL7fjpDhpKZQFPpygzsTMzro").unwrap()
    }

    #[test]
    fn vault_address_is_deterministic() {
        let pid = program_id();
        assert_eq!(vault_address(&pid), vault_address(&pid));
    }

    #[test]
    fn buyer_state_depends_on_wallet() {
        let pid = program_id();
        let vault = vault_address(&pid);
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        assert_eq!(
            buyer_state_address(&pid, &vault, &a),
            buyer_state_address(&pid, &vault, &a)
        );
        assert_ne!(
            buyer_state_address(&pid, &vault, &a),
            buyer_state_address(&pid, &vault, &b)
        );
    }

    #[test]
    fn holding_address_matches_first_principles_derivation() {
        // Oracle: the associated account is the PDA of
        // [owner, token_program, mint] under the associated token program.
        let owner = Pubkey::new_unique();
        let mint = parse_address("3rCZT3Xw6jvU4JWatQPsivS8fQ7gV7GjUfJnbTk9Ssn5").unwrap();
        let expected = Pubkey::find_program_address(
            &[owner.as_ref(), spl_token::id().as_ref(), mint.as_ref()],
            &spl_associated_token_account::id(),
        )
        .0;
        assert_eq!(holding_address(&owner, &mint), expected);
    }

    #[test]
    fn malformed_address_is_a_typed_error() {
        assert!(matches!(
            parse_address("not-a-key"),
            Err(AddressError::Malformed(_))
        ));
        assert!(parse_address("EDY4bp4fXWkAJpJhXUMZLL7fjpDhpKZQFPpygzsTMzro").is_ok());
    }
}
