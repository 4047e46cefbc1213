use crate::error::ConfigError;
use std::path::PathBuf;
use std::thread;

pub const DEFAULT_INPUT: &str = "./measurements.txt";
pub const DEFAULT_ITERATIONS: u32 = 10;

/// Overrides the worker count of the parallel strategy.
pub const WORKERS_ENV: &str = "LINECOUNT_WORKERS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub iterations: u32,
    pub workers: usize,
}

impl Config {
    /// Public CLI is: `[/path/to/input.txt] [iterations]`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let workers = std::env::var(WORKERS_ENV).ok();
        Self::parse(std::env::args().skip(1), workers.as_deref())
    }

    /// Builds the config from the arguments following the program name and
    /// the raw value of [`WORKERS_ENV`].
    pub fn parse(
        mut args: impl Iterator<Item = String>,
        workers: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let input = args
            .next()
            .map_or_else(|| PathBuf::from(DEFAULT_INPUT), PathBuf::from);

        let iterations = match args.next() {
            Some(value) => value
                .parse()
                .map_err(|source| ConfigError::InvalidIterations { value, source })?,
            None => DEFAULT_ITERATIONS,
        };

        let workers = match workers {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidWorkers {
                    var: WORKERS_ENV,
                    value: value.to_string(),
                    source,
                })?,
            None => default_workers(),
        };

        Ok(Self {
            input,
            iterations: iterations.max(1),
            workers: workers.max(1),
        })
    }
}

/// Number of workers the parallel strategy uses unless configured.
pub fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}
