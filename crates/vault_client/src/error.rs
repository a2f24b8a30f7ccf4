use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use vault_codec::CodecError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad user-entered amount or address. Never silently clamped.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The precondition lives in on-chain state the wallet has not met yet
    /// (not whitelisted, never purchased). No transaction is constructed.
    #[error("not eligible: {0}")]
    Ineligible(String),

    /// The operation needs a signature this client cannot produce.
    #[error("operation requires a co-signature from the {0}")]
    MissingCosigner(&'static str),

    /// Account absent on chain. For buyer state this simply means the wallet
    /// has not interacted with the program yet; callers must not treat it as
    /// a failure.
    #[error("account {0} not found")]
    NotFound(Pubkey),

    /// Signing rejection or on-chain constraint violation. The underlying
    /// message is passed through verbatim; the program's text often names
    /// the actionable reason.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// Schema/codec-level failure; a config error that must fail loudly.
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("rpc: {0}")]
    Rpc(String),

    /// Wallet session driven out of order.
    #[error("illegal wallet transition: {0}")]
    IllegalTransition(String),
}

impl From<pda_util::AddressError> for ClientError {
    fn from(err: pda_util::AddressError) -> Self {
        ClientError::InvalidInput(err.to_string())
    }
}
