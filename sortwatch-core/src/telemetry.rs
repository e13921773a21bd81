// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Append-only telemetry persistence.
//!
//! Each collection is a single JSON document holding an array of records.
//! An append reads the whole document, pushes one element and writes it back.
//!
//! Concurrency model:
//! - every collection is owned by one writer thread fed through a queue, so
//!   read-modify-write cycles never overlap and no update is lost;
//! - the new document is written to a sibling temp file, fsynced, then renamed
//!   over the old one, so readers see either the previous or the next complete
//!   array and a failed write leaves prior entries intact;
//! - callers await a one-shot acknowledgement and never hold a lock across I/O.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::{TelemetryError, TelemetryResult};
use crate::records::{HostStatRecord, RequestMetricRecord};
use crate::sampler::{HostLoad, HostSampler, ResourceSnapshot};

/// Collection name of the per-request log.
pub const REQUEST_METRICS: &str = "request_metrics";
/// Collection name of the host snapshot log.
pub const HOST_STATS: &str = "host_stats";

/// A JSON-array file with read-modify-write append.
///
/// Not synchronized: [`AppendLog`] guarantees a single writer per file.
#[derive(Debug, Clone)]
pub struct JsonArrayFile {
    path: PathBuf,
    collection: &'static str,
}

impl JsonArrayFile {
    pub fn new(path: impl Into<PathBuf>, collection: &'static str) -> Self {
        Self {
            path: path.into(),
            collection,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole collection. `None` when it does not exist yet.
    pub fn read(&self) -> TelemetryResult<Option<Vec<Value>>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TelemetryError::Io {
                    collection: self.collection,
                    context: "reading collection",
                    source,
                })
            }
        };

        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|source| TelemetryError::Malformed {
                collection: self.collection,
                source,
            })
    }

    /// Append one record and return the new collection length.
    pub fn append<T: Serialize>(&self, record: &T) -> TelemetryResult<usize> {
        let value = serde_json::to_value(record).map_err(|source| TelemetryError::Serialize {
            collection: self.collection,
            source,
        })?;
        self.append_value(value)
    }

    fn append_value(&self, value: Value) -> TelemetryResult<usize> {
        let mut entries = self.load_for_append();
        entries.push(value);
        self.write_atomic(&entries)?;
        Ok(entries.len())
    }

    /// Existing entries, or an empty collection when the file is missing,
    /// unreadable or malformed. A bad file is moved aside, not overwritten.
    fn load_for_append(&self) -> Vec<Value> {
        match self.read() {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                let quarantine = self.quarantine();
                tracing::warn!(
                    collection = self.collection,
                    path = %self.path.display(),
                    quarantine = ?quarantine,
                    error = %e,
                    "Unusable telemetry collection, starting a new one"
                );
                Vec::new()
            }
        }
    }

    fn quarantine(&self) -> Option<PathBuf> {
        let target = self.sibling(&format!(
            ".corrupt-{}",
            Utc::now().format("%Y%m%dT%H%M%S%3f")
        ));
        match fs::rename(&self.path, &target) {
            Ok(()) => Some(target),
            Err(e) => {
                tracing::warn!(
                    collection = self.collection,
                    error = %e,
                    "Failed to move unusable collection aside"
                );
                None
            }
        }
    }

    fn write_atomic(&self, entries: &[Value]) -> TelemetryResult<()> {
        let io_err = |context: &'static str| {
            let collection = self.collection;
            move |source| TelemetryError::Io {
                collection,
                context,
                source,
            }
        };

        let tmp = self.sibling(".tmp");
        let file = File::create(&tmp).map_err(io_err("creating temp file"))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entries).map_err(|source| {
            TelemetryError::Serialize {
                collection: self.collection,
                source,
            }
        })?;
        writer.flush().map_err(io_err("flushing temp file"))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(io_err("syncing temp file"))?;
        drop(writer);

        fs::rename(&tmp, &self.path).map_err(io_err("replacing collection"))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }
}

struct AppendRequest {
    record: Value,
    reply: oneshot::Sender<TelemetryResult<usize>>,
}

/// Queue-fed single writer for one collection. Cheap to clone; the writer
/// thread exits once every handle is dropped.
#[derive(Debug, Clone)]
pub struct AppendLog {
    file: JsonArrayFile,
    tx: mpsc::UnboundedSender<AppendRequest>,
}

impl AppendLog {
    /// Start the writer thread for `path`.
    pub fn spawn(path: impl Into<PathBuf>, collection: &'static str) -> TelemetryResult<Self> {
        let file = JsonArrayFile::new(path, collection);
        let (tx, mut rx) = mpsc::unbounded_channel::<AppendRequest>();

        let writer = file.clone();
        std::thread::Builder::new()
            .name(format!("{}-writer", collection))
            .spawn(move || {
                while let Some(request) = rx.blocking_recv() {
                    let result = writer.append_value(request.record);
                    // The requester may have gone away; the append still happened.
                    let _ = request.reply.send(result);
                }
                tracing::debug!(collection, "Telemetry writer stopped");
            })
            .map_err(|source| TelemetryError::Io {
                collection,
                context: "spawning writer thread",
                source,
            })?;

        Ok(Self { file, tx })
    }

    pub fn collection(&self) -> &'static str {
        self.file.collection
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Queue one record and wait until it is durably written.
    ///
    /// The record is queued on the first poll, before anything is awaited, so
    /// dropping the future after that does not cancel the append.
    pub async fn append<T: Serialize>(&self, record: &T) -> TelemetryResult<usize> {
        let collection = self.collection();
        let record = serde_json::to_value(record)
            .map_err(|source| TelemetryError::Serialize { collection, source })?;

        let (reply, done) = oneshot::channel();
        self.tx
            .send(AppendRequest { record, reply })
            .map_err(|_| TelemetryError::WriterClosed { collection })?;

        done.await
            .map_err(|_| TelemetryError::WriterClosed { collection })?
    }

    /// Read the full collection from disk.
    pub fn read(&self) -> TelemetryResult<Option<Vec<Value>>> {
        self.file.read()
    }
}

/// Which appends of one [`TelemetryRecorder::record_request`] call landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub request_metric: bool,
    pub host_stat: bool,
}

/// Records per-request metrics and host snapshots. Constructed once at
/// startup and shared by handle.
#[derive(Debug, Clone)]
pub struct TelemetryRecorder {
    requests: AppendLog,
    hosts: AppendLog,
    sampler: HostSampler,
}

impl TelemetryRecorder {
    /// Open both collections, creating `data_dir` if needed.
    pub fn open(
        data_dir: &Path,
        request_log: &str,
        host_log: &str,
        sampler: HostSampler,
    ) -> TelemetryResult<Self> {
        fs::create_dir_all(data_dir).map_err(|source| TelemetryError::DataDir {
            path: data_dir.to_path_buf(),
            source,
        })?;
        Self::new(data_dir.join(request_log), data_dir.join(host_log), sampler)
    }

    pub fn new(
        request_log: impl Into<PathBuf>,
        host_log: impl Into<PathBuf>,
        sampler: HostSampler,
    ) -> TelemetryResult<Self> {
        Ok(Self {
            requests: AppendLog::spawn(request_log, REQUEST_METRICS)?,
            hosts: AppendLog::spawn(host_log, HOST_STATS)?,
            sampler,
        })
    }

    pub fn request_log_path(&self) -> &Path {
        self.requests.path()
    }

    pub fn host_log_path(&self) -> &Path {
        self.hosts.path()
    }

    pub async fn record_request_metric(&self, record: &RequestMetricRecord) -> TelemetryResult<usize> {
        self.requests.append(record).await
    }

    pub async fn record_host_stat(&self, record: &HostStatRecord) -> TelemetryResult<usize> {
        self.hosts.append(record).await
    }

    /// Sample the host, then append one record to each collection.
    ///
    /// The two appends are independent: a failure on one is logged and does
    /// not affect the other. Nothing is returned to the caller but a summary.
    pub async fn record_request(
        &self,
        endpoint: &str,
        method: &str,
        status: u16,
        elapsed: Duration,
    ) -> RecordOutcome {
        let sampler = self.sampler.clone();
        let (snapshot, load): (ResourceSnapshot, HostLoad) =
            tokio::task::spawn_blocking(move || (sampler.snapshot(), sampler.host_load()))
                .await
                .unwrap_or_default();

        let metric = RequestMetricRecord::new(endpoint, method, status, elapsed, snapshot);
        let host = HostStatRecord::new(endpoint, load);

        let (metric_result, host_result) = tokio::join!(
            self.record_request_metric(&metric),
            self.record_host_stat(&host)
        );

        if let Err(e) = &metric_result {
            tracing::warn!(endpoint, collection = REQUEST_METRICS, error = %e, "Telemetry write failed");
        }
        if let Err(e) = &host_result {
            tracing::warn!(endpoint, collection = HOST_STATS, error = %e, "Telemetry write failed");
        }

        RecordOutcome {
            request_metric: metric_result.is_ok(),
            host_stat: host_result.is_ok(),
        }
    }

    /// Full request-metric collection, `None` if nothing was recorded yet.
    pub fn request_metrics(&self) -> TelemetryResult<Option<Vec<Value>>> {
        self.requests.read()
    }

    /// Full host-stat collection, `None` if nothing was recorded yet.
    pub fn host_stats(&self) -> TelemetryResult<Option<Vec<Value>>> {
        self.hosts.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_append_creates_single_element_collection() {
        let temp_dir = TempDir::new().unwrap();
        let file = JsonArrayFile::new(temp_dir.path().join("log.json"), "test");

        assert!(file.read().unwrap().is_none());
        assert_eq!(file.append(&serde_json::json!({"n": 1})).unwrap(), 1);

        let entries = file.read().unwrap().unwrap();
        assert_eq!(entries, vec![serde_json::json!({"n": 1})]);
    }

    #[test]
    fn test_append_preserves_prior_entries() {
        let temp_dir = TempDir::new().unwrap();
        let file = JsonArrayFile::new(temp_dir.path().join("log.json"), "test");

        for n in 0..5 {
            file.append(&serde_json::json!({"n": n})).unwrap();
        }

        let entries = file.read().unwrap().unwrap();
        let ns: Vec<_> = entries.iter().map(|e| e["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
        assert!(!temp_dir.path().join("log.json.tmp").exists());
    }

    #[test]
    fn test_malformed_collection_is_quarantined() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.json");
        fs::write(&path, b"[{\"n\": 1}, {\"n\"").unwrap();

        let file = JsonArrayFile::new(&path, "test");
        assert!(matches!(file.read(), Err(TelemetryError::Malformed { .. })));
        assert_eq!(file.append(&serde_json::json!({"n": 2})).unwrap(), 1);

        let quarantined = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .count();
        assert_eq!(quarantined, 1);
    }

    #[test]
    fn test_non_array_document_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.json");
        fs::write(&path, b"{\"n\": 1}").unwrap();

        let file = JsonArrayFile::new(&path, "test");
        assert!(matches!(file.read(), Err(TelemetryError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_append_log_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let log = AppendLog::spawn(temp_dir.path().join("log.json"), "test").unwrap();

        assert_eq!(log.append(&serde_json::json!({"n": 1})).await.unwrap(), 1);
        assert_eq!(log.append(&serde_json::json!({"n": 2})).await.unwrap(), 2);
        assert_eq!(log.read().unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_record_request_writes_both_collections() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = TelemetryRecorder::open(
            temp_dir.path(),
            "metrics.json",
            "hosts.json",
            HostSampler::unavailable(),
        )
        .unwrap();

        let outcome = recorder
            .record_request("/sort", "POST", 200, Duration::from_millis(3))
            .await;
        assert!(outcome.request_metric && outcome.host_stat);

        let metrics = recorder.request_metrics().unwrap().unwrap();
        assert_eq!(metrics[0]["endpoint"], "/sort");
        assert_eq!(metrics[0]["cpuUsage"], 0.0);
        let hosts = recorder.host_stats().unwrap().unwrap();
        assert_eq!(hosts[0]["endpoint"], "/sort");
        assert_eq!(hosts[0]["cpuUsage"], 0.0);
    }

    #[tokio::test]
    async fn test_failing_collection_does_not_block_the_other() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the request log should be makes every write fail.
        let blocked = temp_dir.path().join("metrics.json");
        fs::create_dir(&blocked).unwrap();
        fs::create_dir(temp_dir.path().join("metrics.json.tmp")).unwrap();

        let recorder = TelemetryRecorder::new(
            &blocked,
            temp_dir.path().join("hosts.json"),
            HostSampler::unavailable(),
        )
        .unwrap();

        let outcome = recorder
            .record_request("/items", "GET", 401, Duration::from_millis(1))
            .await;
        assert!(!outcome.request_metric);
        assert!(outcome.host_stat);
        assert_eq!(recorder.host_stats().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_open_reports_data_dir_failure() {
        let temp_dir = TempDir::new().unwrap();
        let not_a_dir = temp_dir.path().join("occupied");
        fs::write(&not_a_dir, b"file").unwrap();

        let err = TelemetryRecorder::open(
            &not_a_dir.join("data"),
            "requests.json",
            "hosts.json",
            HostSampler::unavailable(),
        )
        .unwrap_err();
        match err {
            TelemetryError::DataDir { path, .. } => assert_eq!(path, not_a_dir.join("data")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
