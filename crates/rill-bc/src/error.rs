//! Errors raised while reading or writing the on-disk bytecode formats.

/// Failures while decoding a serialized program or symbol file.
#[derive(Debug, thiserror::Error)]
pub enum BcError {
    #[error("unexpected end of input while decoding bytecode")]
    UnexpectedEof,
    #[error("byte {0:#04x} does not name a known opcode")]
    InvalidOpcode(u8),
    #[error("byte {0:#04x} does not name a known value type code")]
    InvalidValueTag(u8),
    #[error("varint length prefix {0} exceeds the 8-byte maximum")]
    VarintTooWide(u8),
    #[error("string payload was not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("malformed symbol file at line {line}")]
    MalformedSymbolFile { line: usize },
}

pub type BcResult<T> = Result<T, BcError>;
