// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Instrumented execution of a single sorting algorithm.
//!
//! The working copy of the input is made before the measurement window opens.
//! Process memory and load are sampled immediately around the sort, and only
//! the sort itself is timed.

use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::sampler::HostSampler;
use crate::sort::sort_owned;
use crate::types::{Algorithm, SortInput, SortValue};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Outcome of one instrumented sort. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SortResult {
    pub algorithm: Algorithm,
    pub sorted: Vec<SortValue>,
    pub elapsed: Duration,
    /// Resident memory after minus before. Sampling noise can make it negative.
    pub memory_delta_bytes: i64,
    /// Load percentage after minus before.
    pub cpu_delta_percent: f64,
}

impl SortResult {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1_000.0
    }

    pub fn memory_delta_mb(&self) -> f64 {
        self.memory_delta_bytes as f64 / BYTES_PER_MB
    }
}

/// Response shape: raw list plus unit-suffixed strings.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SortResultView<'a> {
    algorithm: Algorithm,
    sorted_list: &'a [SortValue],
    execution_time: String,
    memory_usage: String,
    cpu_usage: String,
}

impl Serialize for SortResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SortResultView {
            algorithm: self.algorithm,
            sorted_list: &self.sorted,
            execution_time: format_ms(self.elapsed_ms()),
            memory_usage: format_mb(self.memory_delta_mb()),
            cpu_usage: format_percent(self.cpu_delta_percent),
        }
        .serialize(serializer)
    }
}

/// Format milliseconds with a `ms` suffix.
pub fn format_ms(ms: f64) -> String {
    format!("{:.4} ms", ms)
}

/// Format megabytes with an `MB` suffix.
pub fn format_mb(mb: f64) -> String {
    format!("{:.4} MB", mb)
}

/// Format a percentage with a `%` suffix.
pub fn format_percent(percent: f64) -> String {
    format!("{:.2} %", percent)
}

/// Measure the execution time of a closure.
pub fn measure<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    (result, elapsed)
}

/// Runs one algorithm under measurement.
#[derive(Debug, Clone)]
pub struct Instrument {
    sampler: HostSampler,
}

impl Instrument {
    pub fn new(sampler: HostSampler) -> Self {
        Self { sampler }
    }

    pub fn sampler(&self) -> &HostSampler {
        &self.sampler
    }

    /// Sort an independent copy of `input` with `algorithm`.
    ///
    /// Never fails: unavailable readings come back as zero and the deltas
    /// are then zero too.
    pub fn run(&self, algorithm: Algorithm, input: &SortInput) -> SortResult {
        let working = input.as_slice().to_vec();

        let before = self.sampler.snapshot();
        let (sorted, elapsed) = measure(|| sort_owned(algorithm, working));
        let after = self.sampler.snapshot();

        let memory_delta_bytes = after.memory_bytes as i64 - before.memory_bytes as i64;
        let cpu_delta_percent = after.load_percent - before.load_percent;

        tracing::debug!(
            algorithm = %algorithm,
            len = sorted.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Sort measured"
        );

        SortResult {
            algorithm,
            sorted,
            elapsed,
            memory_delta_bytes,
            cpu_delta_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::ResourceProbe;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;

    /// Reports a larger footprint on every read.
    #[derive(Debug, Default)]
    struct Growing {
        reads: AtomicU64,
    }

    impl ResourceProbe for Growing {
        fn name(&self) -> &'static str {
            "growing"
        }

        fn process_memory(&self) -> Option<u64> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            Some(1_048_576 * (n + 1))
        }
    }

    #[test]
    fn test_measure() {
        let (result, duration) = measure(|| {
            thread::sleep(Duration::from_millis(5));
            42
        });

        assert_eq!(result, 42);
        assert!(duration >= Duration::from_millis(5));
    }

    #[test]
    fn test_run_without_probes_reports_zero_deltas() {
        let instrument = Instrument::new(HostSampler::unavailable());
        let result = instrument.run(Algorithm::QuickSort, &SortInput::from(vec![5, 3, 8, 1]));

        assert_eq!(result.sorted, SortInput::from(vec![1, 3, 5, 8]).as_slice());
        assert_eq!(result.memory_delta_bytes, 0);
        assert_eq!(result.cpu_delta_percent, 0.0);
    }

    #[test]
    fn test_memory_delta_from_samples() {
        let instrument = Instrument::new(HostSampler::new(vec![Box::new(Growing::default())]));
        let result = instrument.run(Algorithm::BubbleSort, &SortInput::from(vec![2, 1]));

        assert_eq!(result.memory_delta_bytes, 1_048_576);
        assert!((result.memory_delta_mb() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_near_zero_time() {
        let instrument = Instrument::new(HostSampler::unavailable());
        for algorithm in Algorithm::ALL {
            let result = instrument.run(algorithm, &SortInput::default());
            assert!(result.sorted.is_empty());
            assert!(result.elapsed < Duration::from_millis(50));
        }
    }

    #[test]
    fn test_serialized_units() {
        let result = SortResult {
            algorithm: Algorithm::BinarySort,
            sorted: SortInput::from(vec![1, 2]).as_slice().to_vec(),
            elapsed: Duration::from_micros(1500),
            memory_delta_bytes: -524_288,
            cpu_delta_percent: 3.0,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["algorithm"], "binarySort");
        assert_eq!(json["sortedList"], serde_json::json!([1, 2]));
        assert_eq!(json["executionTime"], "1.5000 ms");
        assert_eq!(json["memoryUsage"], "-0.5000 MB");
        assert_eq!(json["cpuUsage"], "3.00 %");
    }
}
