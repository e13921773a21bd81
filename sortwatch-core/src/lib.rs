//! Sortwatch Core Library
//!
//! Core library for the sortwatch benchmark service.
//! Provides the sorter set, instrumented execution, host resource sampling,
//! append-only telemetry persistence, configuration parsing and the
//! auth/record-store collaborators.

pub mod auth;
pub mod benchmark;
pub mod config;
pub mod error;
pub mod instrument;
pub mod items;
pub mod records;
pub mod sampler;
pub mod sort;
pub mod summary;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{bearer_token, StaticTokens, TokenAuthenticator};
pub use benchmark::{parse_sort_request, BenchmarkOrchestrator, BenchmarkReport};
pub use config::{Config, ConfigLoader};
pub use error::{
    HardValidationError, InputError, SortwatchError, SortwatchResult, TelemetryError,
    TelemetryResult,
};
pub use instrument::{Instrument, SortResult};
pub use items::{Item, MemoryStore, NewItem, RecordStore};
pub use records::{HostStatRecord, RequestMetricRecord};
pub use sampler::{HostLoad, HostSampler, ResourceProbe, SamplerStrategy};
pub use telemetry::{RecordOutcome, TelemetryRecorder};
pub use types::{Algorithm, Port, Principal, SortInput, SortValue};
