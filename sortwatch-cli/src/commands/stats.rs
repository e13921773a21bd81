// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `sortwatch stats` command - Summarize persisted telemetry.
//!
//! Reads the collections straight from disk, so it works whether or not the
//! service is running.

use sortwatch_core::summary::{decode_records, latency_by_endpoint, HostSummary, LatencySummary};
use sortwatch_core::telemetry::{JsonArrayFile, HOST_STATS, REQUEST_METRICS};
use sortwatch_core::{ConfigLoader, HostStatRecord, RequestMetricRecord};

pub async fn execute(config_path: &str, host: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_file(config_path)?;
    let data_dir = &config.telemetry.data_dir;

    if host {
        let file = JsonArrayFile::new(data_dir.join(&config.telemetry.host_log), HOST_STATS);
        let Some(entries) = file.read()? else {
            println!("No host stats recorded yet ({}).", file.path().display());
            return Ok(());
        };
        let (records, skipped) = decode_records::<HostStatRecord>(entries);
        print_host_summary(&HostSummary::from_records(&records), skipped);
    } else {
        let file = JsonArrayFile::new(data_dir.join(&config.telemetry.request_log), REQUEST_METRICS);
        let Some(entries) = file.read()? else {
            println!("No request metrics recorded yet ({}).", file.path().display());
            return Ok(());
        };
        let (records, skipped) = decode_records::<RequestMetricRecord>(entries);
        print_latency_table(&records, skipped);
    }

    Ok(())
}

fn print_latency_table(records: &[RequestMetricRecord], skipped: usize) {
    let fmt = LatencySummary::format_latency;

    println!("╔══════════════════════╦═══════╦═══════════╦═══════════╦═══════════╦═══════════╦═══════════╗");
    println!("║ Endpoint             ║ Count ║ Mean      ║ Median    ║ p95       ║ p99       ║ Max       ║");
    println!("╠══════════════════════╬═══════╬═══════════╬═══════════╬═══════════╬═══════════╬═══════════╣");

    for (endpoint, summary) in latency_by_endpoint(records) {
        println!(
            "║ {:<20} ║ {:>5} ║ {:>9} ║ {:>9} ║ {:>9} ║ {:>9} ║ {:>9} ║",
            truncate(&endpoint, 20),
            summary.count,
            fmt(summary.mean_ms),
            fmt(summary.median_ms),
            fmt(summary.p95_ms),
            fmt(summary.p99_ms),
            fmt(summary.max_ms),
        );
    }

    println!("╚══════════════════════╩═══════╩═══════════╩═══════════╩═══════════╩═══════════╩═══════════╝");
    println!();
    println!("Total: {} request(s)", records.len());
    if skipped > 0 {
        println!("Skipped {} unreadable record(s)", skipped);
    }
}

fn print_host_summary(summary: &HostSummary, skipped: usize) {
    println!("Host Load");
    println!("---------");
    println!("  Samples:     {}", summary.count);
    println!(
        "  CPU:         avg {:.2} %, max {:.2} %",
        summary.avg_cpu_percent, summary.max_cpu_percent
    );
    println!(
        "  Memory:      avg {:.2} %, max {:.2} %",
        summary.avg_memory_percent, summary.max_memory_percent
    );
    if skipped > 0 {
        println!("  Skipped:     {}", skipped);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}
