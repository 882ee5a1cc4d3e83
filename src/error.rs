use std::io;

use thiserror::Error;

/// Errors returned by the codec and its persistence layer.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The byte source could not be read.
    #[error("input unavailable: {0}")]
    InputUnavailable(#[source] io::Error),
    /// Writing output or persisting an artifact failed.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    /// A stored code table cannot describe a prefix-free code.
    #[error("malformed code table: {0}")]
    MalformedCodeTable(String),
    /// The bit walk did not end exactly on a symbol boundary.
    #[error("truncated or corrupt stream: {0}")]
    TruncatedOrCorruptStream(String),
    /// The code table handed to the encoder does not cover its input.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
    /// A serialized artifact could not be parsed.
    #[error("malformed file: {0}")]
    MalformedFile(String),
    /// Decoded output does not match the length or digest recorded at compression time.
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;
