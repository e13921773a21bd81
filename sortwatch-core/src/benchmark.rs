// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark orchestration.
//!
//! Parses a `{"list": [...]}` request body into a validated [`SortInput`] and
//! runs every algorithm over its own copy of it, in the fixed order
//! bubble, quick, binary.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::InputError;
use crate::instrument::{Instrument, SortResult};
use crate::sampler::HostSampler;
use crate::types::{Algorithm, SortInput, SortValue};

/// Per-algorithm results of one orchestrated run, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    results: Vec<SortResult>,
}

impl BenchmarkReport {
    /// Result for one algorithm.
    pub fn get(&self, algorithm: Algorithm) -> Option<&SortResult> {
        self.results.iter().find(|r| r.algorithm == algorithm)
    }

    pub fn results(&self) -> &[SortResult] {
        &self.results
    }
}

/// Serialized as `{ "bubbleSort": ..., "quickSort": ..., "binarySort": ... }`.
impl Serialize for BenchmarkReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for result in &self.results {
            map.serialize_entry(result.algorithm.as_str(), result)?;
        }
        map.end()
    }
}

/// Runs the full algorithm set under instrumentation.
#[derive(Debug, Clone)]
pub struct BenchmarkOrchestrator {
    instrument: Instrument,
}

impl BenchmarkOrchestrator {
    pub fn new(sampler: HostSampler) -> Self {
        Self {
            instrument: Instrument::new(sampler),
        }
    }

    /// Run all three algorithms. Each one sorts its own copy of `input`.
    pub fn run(&self, input: &SortInput) -> BenchmarkReport {
        let results = Algorithm::ALL
            .iter()
            .map(|&algorithm| self.instrument.run(algorithm, input))
            .collect();
        BenchmarkReport { results }
    }

    /// Parse a raw request body and run it.
    pub fn run_body(&self, body: &[u8]) -> Result<BenchmarkReport, InputError> {
        let input = parse_sort_request(body)?;
        Ok(self.run(&input))
    }
}

/// Parse a raw `{"list": [number, ...]}` body.
pub fn parse_sort_request(body: &[u8]) -> Result<SortInput, InputError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| InputError::MalformedBody {
        message: e.to_string(),
    })?;
    parse_sort_value(&value)
}

/// Validate an already-decoded body. A missing or `null` list is reported
/// as missing; any non-number element fails with its index.
pub fn parse_sort_value(body: &Value) -> Result<SortInput, InputError> {
    let list = match body.get("list") {
        None | Some(Value::Null) => return Err(InputError::MissingList),
        Some(Value::Array(list)) => list,
        Some(other) => {
            return Err(InputError::NotAList {
                found: json_kind(other),
            })
        }
    };

    let values = list
        .iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::Number(n) => Ok(SortValue::from(n.clone())),
            other => Err(InputError::NonComparable {
                index,
                found: json_kind(other),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SortInput::new(values))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn orchestrator() -> BenchmarkOrchestrator {
        BenchmarkOrchestrator::new(HostSampler::unavailable())
    }

    #[test]
    fn test_run_orders_and_sorts() {
        let report = orchestrator().run(&SortInput::from(vec![5, 3, 8, 1]));

        let order: Vec<_> = report.results().iter().map(|r| r.algorithm).collect();
        assert_eq!(order, Algorithm::ALL);
        for result in report.results() {
            assert_eq!(result.sorted, SortInput::from(vec![1, 3, 5, 8]).as_slice());
        }
    }

    #[test]
    fn test_report_serializes_as_map() {
        let report = orchestrator().run_body(br#"{"list":[5,3,8,1]}"#).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        for key in ["bubbleSort", "quickSort", "binarySort"] {
            assert_eq!(json[key]["sortedList"], json!([1, 3, 5, 8]));
            assert!(json[key]["executionTime"].as_str().unwrap().ends_with("ms"));
            assert!(json[key]["memoryUsage"].as_str().unwrap().ends_with("MB"));
            assert!(json[key]["cpuUsage"].as_str().unwrap().ends_with('%'));
        }
    }

    #[test]
    fn test_parse_accepts_mixed_numbers() {
        let input = parse_sort_value(&json!({"list": [2, -1.5, 0]})).unwrap();
        assert_eq!(input.len(), 3);
    }

    #[test]
    fn test_parse_empty_list() {
        let input = parse_sort_value(&json!({"list": []})).unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn test_parse_missing_list() {
        assert_eq!(
            parse_sort_value(&json!({"items": [1]})),
            Err(InputError::MissingList)
        );
        assert_eq!(
            parse_sort_value(&json!({"list": null})),
            Err(InputError::MissingList)
        );
        assert_eq!(parse_sort_value(&json!([1, 2])), Err(InputError::MissingList));
    }

    #[test]
    fn test_parse_not_a_list() {
        assert_eq!(
            parse_sort_value(&json!({"list": "1,2,3"})),
            Err(InputError::NotAList { found: "string" })
        );
    }

    #[test]
    fn test_parse_non_comparable_element() {
        assert_eq!(
            parse_sort_value(&json!({"list": [1, "two", 3]})),
            Err(InputError::NonComparable {
                index: 1,
                found: "string"
            })
        );
        assert!(matches!(
            parse_sort_value(&json!({"list": [1, [2]]})),
            Err(InputError::NonComparable { index: 1, .. })
        ));
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(
            parse_sort_request(b"{\"list\": [1, 2"),
            Err(InputError::MalformedBody { .. })
        ));
        assert!(matches!(
            parse_sort_request(b""),
            Err(InputError::MalformedBody { .. })
        ));
    }
}
