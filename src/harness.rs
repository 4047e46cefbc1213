//! Self-timed benchmark runs.
//!
//! A [`Source`] owns the input for the whole run, so that every iteration
//! starts from the same state: stream strategies get the shared stream
//! rewound to the start, path strategies open the file themselves.

use crate::error::CountError;
use crate::strategy::Strategy;
use crate::tally::Tally;
use std::fmt;
use std::fs::File;
use std::hint::black_box;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Source<R> {
    path: PathBuf,
    stream: R,
    /// Appended to the strategy name in measurements.
    label: &'static str,
}

impl Source<File> {
    /// Reads the file from disk on every iteration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CountError> {
        let path = path.as_ref().to_path_buf();
        let stream = File::open(&path).map_err(|source| CountError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            stream,
            label: "",
        })
    }
}

impl Source<Cursor<Vec<u8>>> {
    /// Reads the file once; stream strategies then consume an in-memory
    /// stream, which takes the disk out of the measurement.
    pub fn preloaded(path: impl AsRef<Path>) -> Result<Self, CountError> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path).map_err(|source| CountError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            stream: Cursor::new(bytes),
            label: " (ss)",
        })
    }
}

impl<R: Read + Seek> Source<R> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name under which `strategy` is reported for this source.
    pub fn bench_name(&self, strategy: Strategy) -> String {
        format!("{}{}", strategy.name(), self.label)
    }

    /// One invocation of `strategy`.
    pub fn count(&mut self, strategy: Strategy, workers: usize) -> Result<Tally, CountError> {
        strategy.count(&self.path, &mut self.stream, workers)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement {
    pub name: String,
    pub iterations: u32,
    pub elapsed: Duration,
    pub result: Tally,
}

impl Measurement {
    pub fn per_iteration(&self) -> Duration {
        self.elapsed / self.iterations.max(1)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<28} {:>8} {:>14?} {:>14}",
            self.name,
            self.iterations,
            self.per_iteration(),
            self.result.total()
        )
    }
}

/// Invokes `strategy` `iterations` times (at least once) and times the
/// whole loop. The first error aborts the measurement.
pub fn measure<R: Read + Seek>(
    strategy: Strategy,
    source: &mut Source<R>,
    iterations: u32,
    workers: usize,
) -> Result<Measurement, CountError> {
    let iterations = iterations.max(1);
    let name = source.bench_name(strategy);
    debug!(%name, iterations, workers, path = %source.path().display(), "measuring");

    let mut result = Tally::default();
    let begin = Instant::now();
    for _ in 0..iterations {
        result = black_box(source.count(black_box(strategy), workers)?);
    }
    let elapsed = begin.elapsed();

    info!(%name, ?elapsed, total = result.total(), "measured");
    Ok(Measurement {
        name,
        iterations,
        elapsed,
        result,
    })
}
