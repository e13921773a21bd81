// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! All types validate their invariants at creation time.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// One sortable element of a benchmark request.
///
/// Wraps the JSON number exactly as the caller sent it, so an integer goes
/// back out as an integer. Integers compare exactly; anything involving a
/// float compares numerically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortValue(serde_json::Number);

impl SortValue {
    /// Build from a float. Returns None for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self)
    }

    /// Numeric value as a float.
    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }

    /// True when the caller sent an integer literal.
    pub fn is_integer(&self) -> bool {
        self.0.is_i64() || self.0.is_u64()
    }

    /// Get the inner JSON number.
    pub fn as_number(&self) -> &serde_json::Number {
        &self.0
    }
}

impl PartialEq for SortValue {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (a, b) = (&self.0, &other.0);
        match (integer_value(a), integer_value(b)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            (Some(x), None) => cmp_integer_float(x, b.as_f64()?),
            (None, Some(y)) => cmp_integer_float(y, a.as_f64()?).map(Ordering::reverse),
            (None, None) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }
}

fn integer_value(n: &serde_json::Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Exact comparison of an integer with a float, without rounding the integer.
fn cmp_integer_float(int: i128, float: f64) -> Option<Ordering> {
    // 2^127: every i64/u64 lies strictly inside (-2^127, 2^127).
    const BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

    if float.is_nan() {
        return None;
    }
    if float >= BOUND {
        return Some(Ordering::Less);
    }
    if float < -BOUND {
        return Some(Ordering::Greater);
    }

    let floor = float.floor();
    match int.cmp(&(floor as i128)) {
        Ordering::Equal if float > floor => Some(Ordering::Less),
        ordering => Some(ordering),
    }
}

impl From<i64> for SortValue {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

impl From<serde_json::Number> for SortValue {
    fn from(value: serde_json::Number) -> Self {
        Self(value)
    }
}

impl fmt::Display for SortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated benchmark input. Immutable once built; every algorithm works
/// on its own copy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortInput(Vec<SortValue>);

impl SortInput {
    pub fn new(values: Vec<SortValue>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[SortValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i64>> for SortInput {
    fn from(values: Vec<i64>) -> Self {
        Self(values.into_iter().map(SortValue::from).collect())
    }
}

/// The three benchmarked sorting algorithms, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    /// Adjacent-swap exchange sort
    BubbleSort,
    /// First-element-pivot partition sort
    QuickSort,
    /// Binary-search-assisted insertion sort
    BinarySort,
}

impl Algorithm {
    /// Fixed orchestration order.
    pub const ALL: [Algorithm; 3] = [
        Algorithm::BubbleSort,
        Algorithm::QuickSort,
        Algorithm::BinarySort,
    ];

    /// Wire identifier used as the response key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::BubbleSort => "bubbleSort",
            Algorithm::QuickSort => "quickSort",
            Algorithm::BinarySort => "binarySort",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated network port.
/// Must be in range 1-65535 (0 is reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Create a new Port with validation.
    pub fn new(port: u16) -> Result<Self, HardValidationError> {
        if port == 0 {
            return Err(HardValidationError::InvalidPort {
                port,
                reason: "Port 0 is reserved and cannot be used".to_string(),
            });
        }
        Ok(Self(port))
    }

    /// Get the inner port value.
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = HardValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Identity a bearer token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
