// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Statistical summaries over persisted telemetry.
//!
//! Used by `sortwatch stats` to turn the raw request log into per-endpoint
//! latency distributions and the host log into utilization averages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::{HostStatRecord, RequestMetricRecord};

/// Latency distribution over millisecond samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    /// Median (p50)
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub std_dev_ms: f64,
}

impl LatencySummary {
    /// Calculate the distribution of a set of samples (in milliseconds).
    pub fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self {
                count: 0,
                min_ms: 0.0,
                max_ms: 0.0,
                mean_ms: 0.0,
                median_ms: 0.0,
                p95_ms: 0.0,
                p99_ms: 0.0,
                std_dev_ms: 0.0,
            };
        }

        samples.sort_unstable_by(f64::total_cmp);
        let len = samples.len();

        let mean_ms = samples.iter().sum::<f64>() / len as f64;
        let variance = samples
            .iter()
            .map(|&x| {
                let diff = x - mean_ms;
                diff * diff
            })
            .sum::<f64>()
            / len as f64;

        Self {
            count: len,
            min_ms: samples[0],
            max_ms: samples[len - 1],
            mean_ms,
            median_ms: samples[len / 2],
            p95_ms: samples[(len as f64 * 0.95) as usize],
            p99_ms: samples[(len as f64 * 0.99) as usize],
            std_dev_ms: variance.sqrt(),
        }
    }

    /// Format a latency in human-readable form (auto-selects μs/ms/s).
    pub fn format_latency(ms: f64) -> String {
        if ms < 1.0 {
            format!("{:.1}μs", ms * 1_000.0)
        } else if ms < 1_000.0 {
            format!("{:.2}ms", ms)
        } else {
            format!("{:.2}s", ms / 1_000.0)
        }
    }
}

/// Averages and peaks over host snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSummary {
    pub count: usize,
    pub avg_cpu_percent: f64,
    pub max_cpu_percent: f64,
    pub avg_memory_percent: f64,
    pub max_memory_percent: f64,
}

impl HostSummary {
    pub fn from_records(records: &[HostStatRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let count = records.len();
        let sum = |f: fn(&HostStatRecord) -> f64| records.iter().map(f).sum::<f64>();
        let max = |f: fn(&HostStatRecord) -> f64| records.iter().map(f).fold(0.0, f64::max);

        Self {
            count,
            avg_cpu_percent: sum(|r| r.cpu_usage) / count as f64,
            max_cpu_percent: max(|r| r.cpu_usage),
            avg_memory_percent: sum(|r| r.memory_usage) / count as f64,
            max_memory_percent: max(|r| r.memory_usage),
        }
    }
}

/// Group request records by endpoint and summarize each group's latency.
pub fn latency_by_endpoint(records: &[RequestMetricRecord]) -> BTreeMap<String, LatencySummary> {
    let mut by_endpoint: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records {
        by_endpoint
            .entry(record.endpoint.clone())
            .or_default()
            .push(record.elapsed_time);
    }

    by_endpoint
        .into_iter()
        .map(|(endpoint, samples)| (endpoint, LatencySummary::from_samples(samples)))
        .collect()
}

/// Decode the entries of a persisted collection, skipping any that do not
/// match the record shape. Returns the decoded records and the skip count.
pub fn decode_records<T: serde::de::DeserializeOwned>(entries: Vec<Value>) -> (Vec<T>, usize) {
    let total = entries.len();
    let records: Vec<T> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    let skipped = total - records.len();
    (records, skipped)
}
