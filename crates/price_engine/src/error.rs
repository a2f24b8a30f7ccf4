use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceError {
    /// One provider failed or returned an implausible shape. Never fatal;
    /// the race simply moves on.
    #[error("price source `{provider}` unavailable: {reason}")]
    SourceUnavailable {
        provider: &'static str,
        reason: String,
    },

    /// Every provider failed and no acceptable cached value exists. The
    /// consumer must render unknown, not zero.
    #[error("all price sources exhausted")]
    AllSourcesExhausted,
}
