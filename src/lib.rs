//! Micro-benchmarks of different ways to read a file and count its bytes
//! and newlines.
//!
//! Every [`Strategy`] produces the same [`Tally`]; the byte length of the
//! file plus the number of `\n` bytes in it. They differ only in the I/O
//! pattern, which is what gets measured.

#![deny(missing_debug_implementations)]

pub mod chunk_iter;
pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod strategy;
pub mod tally;

pub use config::Config;
pub use error::{ConfigError, CountError};
pub use harness::{measure, Measurement, Source};
pub use strategy::Strategy;
pub use tally::Tally;
