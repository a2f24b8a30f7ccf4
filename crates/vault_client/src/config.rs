//! The single authoritative home of the deployment's addresses. Everything
//! downstream takes a [`ProgramConfig`] built once at startup; no constant is
//! repeated at a call site.

use solana_sdk::pubkey::Pubkey;

use crate::error::ClientError;

pub const DEFAULT_PROGRAM_ID: &str = "EDY4bp4fXWkAJpJhXUMZLL7fjpDhpKZQFPpygzsTMzro";
pub const DEFAULT_MINT: &str = "3rCZT3Xw6jvU4JWatQPsivS8fQ7gV7GjUfJnbTk9Ssn5";
pub const DEFAULT_TREASURY: &str = "CEUmazdgtbUCcQyLq6NCm4BuQbvCsYFzKsS5wdRvZehV";
pub const DEFAULT_FOUNDER: &str = "AqPFb5LWQuzKiyoKTX9XgUwsYWoFvpeE8E8uzQvnDTzT";

#[derive(Debug, Clone)]
pub struct ProgramConfig {
    pub program_id: Pubkey,
    pub mint: Pubkey,
    pub treasury: Pubkey,
    pub founder: Pubkey,
}

impl ProgramConfig {
    pub fn new(
        program_id: &str,
        mint: &str,
        treasury: &str,
        founder: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            program_id: pda_util::parse_address(program_id)?,
            mint: pda_util::parse_address(mint)?,
            treasury: pda_util::parse_address(treasury)?,
            founder: pda_util::parse_address(founder)?,
        })
    }

    /// The known mainnet deployment.
    pub fn mainnet() -> Self {
        Self::new(
            DEFAULT_PROGRAM_ID,
            DEFAULT_MINT,
            DEFAULT_TREASURY,
            DEFAULT_FOUNDER,
        )
        .expect("default addresses are well-formed")
    }

    pub fn vault(&self) -> Pubkey {
        pda_util::vault_address(&self.program_id)
    }

    pub fn buyer_state(&self, wallet: &Pubkey) -> Pubkey {
        pda_util::buyer_state_address(&self.program_id, &self.vault(), wallet)
    }

    pub fn vault_holding(&self) -> Pubkey {
        pda_util::holding_address(&self.vault(), &self.mint)
    }

    pub fn holding(&self, owner: &Pubkey) -> Pubkey {
        pda_util::holding_address(owner, &self.mint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_defaults_parse() {
        let cfg = ProgramConfig::mainnet();
        assert_eq!(cfg.program_id.to_string(), DEFAULT_PROGRAM_ID);
        // Derived addresses are stable for a fixed config.
        assert_eq!(cfg.vault(), cfg.vault());
        assert_eq!(cfg.vault_holding(), cfg.vault_holding());
    }

    #[test]
    fn bad_override_is_invalid_input() {
        let err = ProgramConfig::new("nope", DEFAULT_MINT, DEFAULT_TREASURY, DEFAULT_FOUNDER)
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}
