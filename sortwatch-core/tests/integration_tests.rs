// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end tests for the sortwatch core.
//!
//! These tests exercise the telemetry pipeline under concurrent writers and
//! the orchestrator with a degraded sampler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sortwatch_core::records::RequestMetricRecord;
use sortwatch_core::sampler::ResourceSnapshot;
use sortwatch_core::telemetry::JsonArrayFile;
use sortwatch_core::{
    Algorithm, BenchmarkOrchestrator, ConfigLoader, HostSampler, SortInput, TelemetryRecorder,
};
use tempfile::TempDir;

fn recorder(temp_dir: &TempDir) -> TelemetryRecorder {
    TelemetryRecorder::open(
        temp_dir.path(),
        "performance_metrics.json",
        "docker_metrics.json",
        HostSampler::unavailable(),
    )
    .expect("Failed to open recorder")
}

/// N concurrent appends must all land, and a reader polling the file the
/// whole time must never see an unparseable document.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_lose_nothing() {
    const WRITERS: usize = 64;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let recorder = recorder(&temp_dir);

    let stop = Arc::new(AtomicBool::new(false));
    let reader = {
        let file = JsonArrayFile::new(recorder.request_log_path(), "reader");
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut observed = 0usize;
            while !stop.load(Ordering::Relaxed) {
                match file.read() {
                    Ok(Some(entries)) => {
                        assert!(entries.len() >= observed, "collection shrank");
                        observed = entries.len();
                    }
                    Ok(None) => assert_eq!(observed, 0, "collection disappeared"),
                    Err(e) => panic!("reader saw a broken collection: {}", e),
                }
            }
            observed
        })
    };

    let mut handles = Vec::with_capacity(WRITERS);
    for n in 0..WRITERS {
        let recorder = recorder.clone();
        handles.push(tokio::spawn(async move {
            let record = RequestMetricRecord::new(
                format!("/concurrent/{}", n),
                "GET",
                200,
                Duration::from_millis(1),
                ResourceSnapshot::default(),
            );
            recorder.record_request_metric(&record).await
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("task panicked")
            .expect("append failed");
    }

    stop.store(true, Ordering::Relaxed);
    reader.join().expect("reader panicked");

    let entries = recorder
        .request_metrics()
        .expect("read failed")
        .expect("collection missing");
    assert_eq!(entries.len(), WRITERS);

    let mut endpoints: Vec<_> = entries
        .iter()
        .map(|e| e["endpoint"].as_str().unwrap().to_string())
        .collect();
    endpoints.sort();
    endpoints.dedup();
    assert_eq!(endpoints.len(), WRITERS);
}

/// Dropping the caller's future after the record is queued must not cancel
/// the append.
#[tokio::test]
async fn test_abandoned_append_still_lands() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let recorder = recorder(&temp_dir);

    let record = RequestMetricRecord::new(
        "/abandoned",
        "POST",
        200,
        Duration::from_millis(1),
        ResourceSnapshot::default(),
    );
    {
        let future = Box::pin(recorder.record_request_metric(&record));
        // Poll once so the record is queued, then drop.
        let _ = tokio::time::timeout(Duration::from_nanos(1), future).await;
    }

    // A later append is queued behind it on the same writer.
    recorder
        .record_request("/after", "GET", 200, Duration::ZERO)
        .await;

    let entries = recorder.request_metrics().unwrap().unwrap();
    let endpoints: Vec<_> = entries
        .iter()
        .map(|e| e["endpoint"].as_str().unwrap())
        .collect();
    assert_eq!(endpoints, vec!["/abandoned", "/after"]);
}

#[tokio::test]
async fn test_corrupted_request_log_restarts_collection() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let recorder = recorder(&temp_dir);
    std::fs::write(recorder.request_log_path(), b"timestamp,endpoint\n1,/sort\n").unwrap();

    let outcome = recorder
        .record_request("/sort", "POST", 200, Duration::from_millis(2))
        .await;
    assert!(outcome.request_metric);
    assert!(outcome.host_stat);

    let entries = recorder.request_metrics().unwrap().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["endpoint"], "/sort");
}

#[test]
fn test_orchestrator_with_unavailable_sampler() {
    let orchestrator = BenchmarkOrchestrator::new(HostSampler::unavailable());
    let report = orchestrator.run(&SortInput::from(vec![9, -2, 9, 0, 4]));

    for algorithm in Algorithm::ALL {
        let result = report.get(algorithm).expect("missing algorithm");
        assert_eq!(result.sorted, SortInput::from(vec![-2, 0, 4, 9, 9]).as_slice());
        assert_eq!(result.cpu_delta_percent, 0.0);
        assert_eq!(result.memory_delta_bytes, 0);
    }
}

#[test]
fn test_config_file_loading() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("sortwatch.yaml");

    std::fs::write(
        &config_path,
        r#"
server:
  port: 9999
telemetry:
  data_dir: /tmp/sortwatch-test
sampler:
  strategy: none
auth:
  tokens:
    - token: test-token
      principal: tester
"#,
    )
    .expect("Failed to write config");

    let config = ConfigLoader::load_file(&config_path).expect("Failed to load config");
    assert_eq!(config.server.port.value(), 9999);
    assert_eq!(config.tokens.len(), 1);
    assert_eq!(
        config.telemetry.data_dir,
        std::path::PathBuf::from("/tmp/sortwatch-test")
    );
}
