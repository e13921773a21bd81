// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Telemetry record types.
//!
//! One [`RequestMetricRecord`] and one [`HostStatRecord`] are appended per
//! handled request. Records are never updated after creation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sampler::{HostLoad, ResourceSnapshot};

/// Per-request latency and process footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetricRecord {
    pub timestamp: DateTime<Utc>,
    /// Request path
    pub endpoint: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: u16,
    /// Process resident memory at request end, in bytes
    pub memory_usage: u64,
    /// Request wall time in milliseconds, two decimals
    pub elapsed_time: f64,
    /// Load-average snapshot as a percentage
    pub cpu_usage: f64,
}

impl RequestMetricRecord {
    pub fn new(
        endpoint: impl Into<String>,
        method: impl Into<String>,
        status: u16,
        elapsed: Duration,
        snapshot: ResourceSnapshot,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            endpoint: endpoint.into(),
            method: method.into(),
            status,
            memory_usage: snapshot.memory_bytes,
            elapsed_time: round2(elapsed.as_secs_f64() * 1_000.0),
            cpu_usage: snapshot.load_percent,
        }
    }
}

/// Host-wide utilization at the end of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatRecord {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    /// Host CPU utilization percentage
    pub cpu_usage: f64,
    /// Host memory utilization percentage
    pub memory_usage: f64,
}

impl HostStatRecord {
    pub fn new(endpoint: impl Into<String>, load: HostLoad) -> Self {
        Self {
            timestamp: Utc::now(),
            endpoint: endpoint.into(),
            cpu_usage: round2(load.cpu_percent),
            memory_usage: round2(load.memory_percent),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
