//! Error types.

use std::io;
use std::path::PathBuf;

/// Errors of a single counting invocation.
#[derive(Debug, thiserror::Error)]
pub enum CountError {
    #[error("file {} can't be opened: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("I/O error while counting: {0}")]
    Io(#[from] io::Error),

    /// The input changed size between querying its length and reading it.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("file of {0} bytes doesn't fit into memory on this platform")]
    TooLarge(u64),
}

/// Errors while assembling the run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid iteration count {value:?}: {source}")]
    InvalidIterations {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid worker count {value:?} in {var}: {source}")]
    InvalidWorkers {
        var: &'static str,
        value: String,
        source: std::num::ParseIntError,
    },
}
