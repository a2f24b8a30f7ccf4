use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Operation name, argument set, or account binding does not match the
    /// schema. Always a programming/config error, never a runtime condition.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Byte buffer shorter than the layout requires.
    #[error("truncated data: need at least {needed} bytes, got {got}")]
    TruncatedData { needed: usize, got: usize },

    /// Account data whose type discriminator this schema does not know.
    /// Decoding must refuse rather than guess a layout.
    #[error("unknown account discriminator {0:02x?}")]
    UnknownDiscriminator([u8; 8]),
}
