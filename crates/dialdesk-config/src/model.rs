// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Dialdesk configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialdeskConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP API settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Retry defaults and bounds for scheduled calls.
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// In-process dispatcher settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Outbound telephony provider.
    #[serde(default)]
    pub telephony: TelephonyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on every authenticated route. When unset the
    /// API rejects all authenticated requests.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("dialdesk").join("dialdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("dialdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Scheduling defaults and optional retry bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulingConfig {
    /// Retry intervals (minutes) offered to clients. Informational: any
    /// positive interval is accepted.
    #[serde(default = "default_retry_intervals")]
    pub retry_intervals: Vec<u32>,

    /// Interval applied when a request omits `retry_interval`.
    #[serde(default = "default_retry_interval")]
    pub default_retry_interval: u32,

    /// Total attempts after which a retrying call fails. Unset is unbounded.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Hours after a call's first dispatchable instant during which retries
    /// may still be scheduled. Unset is unbounded.
    #[serde(default)]
    pub retry_horizon_hours: Option<u32>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            retry_intervals: default_retry_intervals(),
            default_retry_interval: default_retry_interval(),
            max_attempts: None,
            retry_horizon_hours: None,
        }
    }
}

fn default_retry_intervals() -> Vec<u32> {
    vec![30, 60, 120, 240, 1440]
}

fn default_retry_interval() -> u32 {
    60
}

/// In-process dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Run the polling dispatcher inside `serve`.
    #[serde(default = "default_dispatch_enabled")]
    pub enabled: bool,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum number of due calls handled per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_dispatch_enabled(),
            poll_interval_secs: default_poll_interval_secs(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_dispatch_enabled() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    50
}

/// Telephony provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelephonyConfig {
    /// Provider base URL. `None` refuses every outbound call.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer credential sent to the provider.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_telephony_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_telephony_timeout_secs(),
        }
    }
}

fn default_telephony_timeout_secs() -> u64 {
    30
}
