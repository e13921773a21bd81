// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Validates the service configuration at boot-up time.
//! Any invalid field results in a HardValidationError that prevents startup.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{HardValidationError, SortwatchError, SortwatchResult};
use crate::sampler::SamplerStrategy;
use crate::types::{Port, Principal};

/// Raw server section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawServerConfig {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    prometheus_port: Option<u16>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for RawServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            prometheus_port: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTelemetryConfig {
    #[serde(default = "default_data_dir")]
    data_dir: String,
    #[serde(default = "default_request_log")]
    request_log: String,
    #[serde(default = "default_host_log")]
    host_log: String,
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_request_log() -> String {
    "performance_metrics.json".to_string()
}

fn default_host_log() -> String {
    "docker_metrics.json".to_string()
}

impl Default for RawTelemetryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            request_log: default_request_log(),
            host_log: default_host_log(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSamplerConfig {
    #[serde(default)]
    strategy: SamplerStrategy,
    #[serde(default)]
    command: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawTokenEntry {
    token: String,
    principal: String,
}

#[derive(Debug, Deserialize)]
struct RawAuthConfig {
    tokens: Vec<RawTokenEntry>,
}

#[derive(Debug, Deserialize)]
struct RawItemSeed {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    server: RawServerConfig,
    #[serde(default)]
    telemetry: RawTelemetryConfig,
    #[serde(default)]
    sampler: RawSamplerConfig,
    auth: RawAuthConfig,
    #[serde(default)]
    items: Vec<RawItemSeed>,
}

/// Validated listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: Port,
    pub prometheus_port: Option<Port>,
}

/// Validated telemetry file locations.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub data_dir: PathBuf,
    pub request_log: String,
    pub host_log: String,
}

/// Validated sampler selection.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub strategy: SamplerStrategy,
    pub command: Option<Vec<String>>,
}

/// One accepted bearer token.
#[derive(Debug, Clone)]
pub struct TokenEntry {
    pub token: String,
    pub principal: Principal,
}

/// Record store seed entry.
#[derive(Debug, Clone)]
pub struct ItemSeed {
    pub name: String,
    pub value: serde_json::Value,
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub sampler: SamplerConfig,
    pub tokens: Vec<TokenEntry>,
    pub items: Vec<ItemSeed>,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    /// Returns HardValidationError for any invalid fields.
    pub fn load_file(path: impl AsRef<Path>) -> SortwatchResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SortwatchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SortwatchError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> SortwatchResult<Config> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| SortwatchError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> SortwatchResult<Config> {
        let server = Self::validate_server(raw.server)?;
        let telemetry = Self::validate_telemetry(raw.telemetry)?;
        let sampler = Self::validate_sampler(raw.sampler)?;
        let tokens = Self::validate_tokens(raw.auth)?;

        let mut items = Vec::with_capacity(raw.items.len());
        for (index, seed) in raw.items.into_iter().enumerate() {
            if seed.name.trim().is_empty() {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "items.name",
                    value: format!("item at index {}", index),
                    reason: "Item name cannot be empty".to_string(),
                }
                .into());
            }
            items.push(ItemSeed {
                name: seed.name,
                value: seed.value,
            });
        }

        Ok(Config {
            server,
            telemetry,
            sampler,
            tokens,
            items,
        })
    }

    fn validate_server(raw: RawServerConfig) -> SortwatchResult<ServerConfig> {
        let bind: IpAddr = raw
            .bind
            .parse()
            .map_err(|_| HardValidationError::InvalidFieldValue {
                field: "server.bind",
                value: raw.bind.clone(),
                reason: "Must be an IPv4 or IPv6 address".to_string(),
            })?;

        let port = Port::new(raw.port)?;
        let prometheus_port = raw.prometheus_port.map(Port::new).transpose()?;

        if prometheus_port == Some(port) {
            return Err(HardValidationError::InvalidPort {
                port: port.value(),
                reason: "Prometheus exporter must not share the HTTP port".to_string(),
            }
            .into());
        }

        Ok(ServerConfig {
            bind,
            port,
            prometheus_port,
        })
    }

    fn validate_telemetry(raw: RawTelemetryConfig) -> SortwatchResult<TelemetryConfig> {
        if raw.data_dir.trim().is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "telemetry.data_dir",
                value: raw.data_dir,
                reason: "Data directory cannot be empty".to_string(),
            }
            .into());
        }

        for (field, name) in [
            ("telemetry.request_log", &raw.request_log),
            ("telemetry.host_log", &raw.host_log),
        ] {
            let is_plain_name = !name.is_empty()
                && Path::new(name).file_name().map(|f| f == name.as_str()) == Some(true);
            if !is_plain_name {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: name.clone(),
                    reason: "Must be a plain file name inside data_dir".to_string(),
                }
                .into());
            }
        }

        if raw.request_log == raw.host_log {
            return Err(HardValidationError::InvalidFieldValue {
                field: "telemetry.host_log",
                value: raw.host_log,
                reason: "Request and host logs must be different files".to_string(),
            }
            .into());
        }

        Ok(TelemetryConfig {
            data_dir: PathBuf::from(raw.data_dir),
            request_log: raw.request_log,
            host_log: raw.host_log,
        })
    }

    fn validate_sampler(raw: RawSamplerConfig) -> SortwatchResult<SamplerConfig> {
        if let Some(command) = &raw.command {
            if command.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "sampler.command",
                    value: format!("{:?}", command),
                    reason: "Command must name a program".to_string(),
                }
                .into());
            }
        }

        if raw.strategy == SamplerStrategy::Command && raw.command.is_none() {
            return Err(HardValidationError::MissingRequiredField {
                field: "command",
                context: "sampler with strategy 'command'".to_string(),
            }
            .into());
        }

        Ok(SamplerConfig {
            strategy: raw.strategy,
            command: raw.command,
        })
    }

    fn validate_tokens(raw: RawAuthConfig) -> SortwatchResult<Vec<TokenEntry>> {
        if raw.tokens.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "tokens",
                context: "auth".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        let mut tokens = Vec::with_capacity(raw.tokens.len());
        for entry in raw.tokens {
            if entry.token.trim().is_empty() || entry.token.chars().any(char::is_whitespace) {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "auth.tokens.token",
                    value: format!("token for {}", entry.principal),
                    reason: "Token must be non-empty and contain no whitespace".to_string(),
                }
                .into());
            }
            if entry.principal.trim().is_empty() {
                return Err(HardValidationError::MissingRequiredField {
                    field: "principal",
                    context: "auth token entry".to_string(),
                }
                .into());
            }
            if !seen.insert(entry.token.clone()) {
                return Err(HardValidationError::DuplicateToken {
                    principal: entry.principal,
                }
                .into());
            }
            tokens.push(TokenEntry {
                token: entry.token,
                principal: Principal::new(entry.principal),
            });
        }

        Ok(tokens)
    }
}
