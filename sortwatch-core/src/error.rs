//! Custom error types for sortwatch.
//!
//! Explicit enum error types only. No `Box<dyn Error>`, no `anyhow::Result`
//! in library code - every failure is a named variant.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for configuration and service startup.
#[derive(Debug, Error)]
pub enum SortwatchError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    // =========================================================================
    // Telemetry Errors - Logged, never surfaced to clients
    // =========================================================================
    #[error("Telemetry write failure: {0}")]
    Telemetry(#[from] TelemetryError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors prevent the service from starting.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid port: {port} - {reason}")]
    InvalidPort { port: u16, reason: String },

    #[error("Duplicate bearer token for principal: {principal}")]
    DuplicateToken { principal: String },
}

/// Malformed benchmark request bodies. Surfaced to the caller as 400.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Request body is not valid JSON: {message}")]
    MalformedBody { message: String },

    #[error("Request body is missing the 'list' field")]
    MissingList,

    #[error("Field 'list' must be an array, got {found}")]
    NotAList { found: &'static str },

    #[error("Element {index} of 'list' is not a number (got {found})")]
    NonComparable { index: usize, found: &'static str },
}

/// Persisted-collection failures. Isolated per collection.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("IO error on {collection} collection: {context} - {source}")]
    Io {
        collection: &'static str,
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {collection} record: {source}")]
    Serialize {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Collection {collection} is not a valid JSON array: {source}")]
    Malformed {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create telemetry directory {}: {source}", path.display())]
    DataDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Writer for {collection} collection has shut down")]
    WriterClosed { collection: &'static str },
}

/// Result type alias using SortwatchError.
pub type SortwatchResult<T> = Result<T, SortwatchError>;

/// Result type alias for telemetry persistence.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
