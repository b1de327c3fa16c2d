use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the codec and file layer.
///
/// Nothing here is logged or retried internally; every failure goes
/// straight back to the caller.
#[derive(Debug, Error)]
pub enum CsmfError {
    /// The bytes are not a valid `CsmfFile` message.
    #[error("malformed measurement file: {0}")]
    MalformedFile(#[source] prost::DecodeError),

    /// A single measurement could not be reconstructed. Aborts the whole
    /// collection decode.
    #[error("malformed measurement #{index}: {reason}")]
    MalformedMeasurement { index: usize, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CsmfError>;
