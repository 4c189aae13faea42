//! Error types for the data grid.

use crate::types::PartitionId;
use thiserror::Error;

/// Result type alias for data grid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the data grid.
#[derive(Error, Debug)]
pub enum Error {
    /// Snapshot wire codec errors.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Transport envelope encoding/decoding errors.
    #[error("envelope error: {0}")]
    Envelope(String),

    /// The requested partition id is outside the configured partition count.
    #[error("unknown partition: {0}")]
    UnknownPartition(PartitionId),

    /// The partition's execution context is no longer running.
    #[error("partition {0} executor stopped")]
    ExecutorStopped(PartitionId),
}

/// Errors produced while encoding or decoding the snapshot wire format.
///
/// A decode error means no part of the input was applied anywhere; the
/// receiving side's state is untouched.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid count: {0}")]
    InvalidCount(i32),

    #[error("invalid length: {0}")]
    InvalidLength(i64),

    #[error("invalid map name: {0}")]
    InvalidMapName(#[from] std::string::FromUtf8Error),

    #[error("invalid field {field}: {value}")]
    InvalidField { field: &'static str, value: i64 },
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Envelope(e.to_string())
    }
}
