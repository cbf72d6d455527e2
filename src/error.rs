//! Error types for decoding and encoding

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Unexpected end of data: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("Trailing bytes after locktime: {0}")]
    TrailingBytes(usize),

    #[error("Non-canonical CompactSize at offset {0}")]
    NonCanonicalVarInt(usize),

    #[error("Invalid version prefix: 0x{0:02x}")]
    InvalidPrefix(u8),

    #[error("Script hash must be 20 bytes, got {0}")]
    InvalidScriptHashLength(usize),

    #[error("Invalid Base58: {0}")]
    InvalidBase58(String),

    #[error("Checksum mismatch")]
    InvalidChecksum,

    #[error("Transaction has superfluous witness data")]
    SuperfluousWitness,
}

impl From<hex::FromHexError> for DecodingError {
    fn from(err: hex::FromHexError) -> Self {
        DecodingError::InvalidHex(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DecodingError>;

/// Failures raised by simulator opcodes.
///
/// The `Display` text doubles as the error marker pushed onto the stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("Error: Insufficient items")]
    InsufficientItems,

    #[error("Error: Expected integer operands")]
    ExpectedInteger,

    #[error("Error: Expected byte string")]
    ExpectedBytes,

    #[error("Error: VERIFY failed")]
    VerifyFailed,

    #[error("Error: Invalid public key")]
    InvalidPublicKey,

    #[error("Error: Invalid signature")]
    InvalidSignature,

    #[error("Error: Invalid count")]
    InvalidCount,

    #[error("Error: Unknown opcode {0}")]
    UnknownOpcode(String),
}
