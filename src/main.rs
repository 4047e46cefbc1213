#![deny(
    clippy::all,
    clippy::nursery,
    clippy::must_use_candidate,
    // clippy::restriction,
    // clippy::pedantic
)]
// I can't do anything about this; fault of the dependencies
#![allow(clippy::multiple_crate_versions)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::all)]

use linecount_bench::{logging, measure, Config, Measurement, Source, Strategy};
use std::time::Instant;
use tracing::warn;

fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let begin = Instant::now();
    let config = Config::from_env()?;

    println!(
        "{:<28} {:>8} {:>14} {:>14}",
        "Benchmark", "Iter", "Time/iter", "Result"
    );

    let mut measurements = Vec::new();

    let mut on_disk = Source::open(&config.input)?;
    for strategy in Strategy::ALL {
        let measurement = measure(strategy, &mut on_disk, config.iterations, config.workers)?;
        println!("{measurement}");
        measurements.push(measurement);
    }

    // Same stream strategies, but without the disk.
    let mut in_memory = Source::preloaded(&config.input)?;
    for strategy in Strategy::ALL.into_iter().filter(|s| s.uses_stream()) {
        let measurement = measure(strategy, &mut in_memory, config.iterations, config.workers)?;
        println!("{measurement}");
        measurements.push(measurement);
    }

    report_disagreement(&measurements);
    println!("took {:?}", begin.elapsed());
    Ok(())
}

fn report_disagreement(measurements: &[Measurement]) {
    let Some(first) = measurements.first() else {
        return;
    };
    for other in measurements.iter().filter(|m| m.result != first.result) {
        warn!(
            expected = first.result.total(),
            actual = other.result.total(),
            "{} disagrees with {}",
            other.name,
            first.name
        );
    }
}
