// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `sortwatch bench` command - Run the benchmark locally.
//!
//! Takes a comma-separated list, runs all three sorters through the same
//! orchestrator the service uses and prints the JSON the service would
//! answer with.

use std::path::Path;

use serde_json::{json, Value};
use sortwatch_core::benchmark::parse_sort_value;
use sortwatch_core::{BenchmarkOrchestrator, ConfigLoader, HostSampler};

pub async fn execute(config_path: &str, list: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let sampler = if Path::new(config_path).exists() {
        let config = ConfigLoader::load_file(config_path)?;
        HostSampler::from_strategy(config.sampler.strategy, config.sampler.command.as_deref())
    } else {
        tracing::info!(config = %config_path, "No configuration file, using default sampler");
        HostSampler::default()
    };

    // Same validation as /sort, so a bad element is reported by index.
    let input = parse_sort_value(&list_body(list))?;
    let orchestrator = BenchmarkOrchestrator::new(sampler);
    let report = tokio::task::spawn_blocking(move || orchestrator.run(&input)).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// `{"list": [...]}` with each argument read as a JSON value. Anything that
/// does not parse is kept as a string and rejected by validation.
fn list_body(list: &[String]) -> Value {
    let values: Vec<Value> = list
        .iter()
        .map(|raw| {
            let raw = raw.trim();
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        })
        .collect();
    json!({ "list": values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortwatch_core::InputError;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_list_body_keeps_number_kinds() {
        let body = list_body(&args(&["5", " 3 ", "-1.5"]));
        assert_eq!(body, json!({"list": [5, 3, -1.5]}));
    }

    #[test]
    fn test_bad_element_reported_by_index() {
        let err = parse_sort_value(&list_body(&args(&["1", "foo"]))).unwrap_err();
        assert!(matches!(err, InputError::NonComparable { index: 1, .. }));
    }

    #[test]
    fn test_argument_cannot_rewrite_body() {
        let body = list_body(&args(&["1],\"list\":[2"]));
        assert_eq!(body["list"].as_array().map(Vec::len), Some(1));
        assert!(parse_sort_value(&body).is_err());
    }
}
