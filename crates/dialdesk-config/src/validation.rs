// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: non-empty host and paths,
//! positive intervals, a usable telephony endpoint.

use dialdesk_core::MAX_RETRY_INTERVAL_MINUTES;

use crate::diagnostic::ConfigError;
use crate::model::DialdeskConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first.
pub fn validate_config(config: &DialdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        invalid(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        invalid("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            invalid(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.server.port == 0 {
        invalid("server.port must be between 1 and 65535".to_string());
    }

    if let Some(token) = &config.server.bearer_token
        && token.trim().is_empty()
    {
        invalid("server.bearer_token must not be blank when set".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    let interval_range = 1..=MAX_RETRY_INTERVAL_MINUTES;
    for (i, interval) in config.scheduling.retry_intervals.iter().enumerate() {
        if !interval_range.contains(interval) {
            invalid(format!(
                "scheduling.retry_intervals[{i}] must be between 1 and {MAX_RETRY_INTERVAL_MINUTES} minutes"
            ));
        }
    }

    if !interval_range.contains(&config.scheduling.default_retry_interval) {
        invalid(format!(
            "scheduling.default_retry_interval must be between 1 and {MAX_RETRY_INTERVAL_MINUTES} minutes"
        ));
    }

    if config.scheduling.max_attempts == Some(0) {
        invalid("scheduling.max_attempts must be at least 1 when set".to_string());
    }

    if config.scheduling.retry_horizon_hours == Some(0) {
        invalid("scheduling.retry_horizon_hours must be at least 1 when set".to_string());
    }

    if config.dispatch.poll_interval_secs == 0 {
        invalid("dispatch.poll_interval_secs must be at least 1".to_string());
    }

    if config.dispatch.batch_size == 0 {
        invalid("dispatch.batch_size must be at least 1".to_string());
    }

    if let Some(endpoint) = &config.telephony.endpoint {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            invalid(format!(
                "telephony.endpoint `{endpoint}` must be an http:// or https:// URL"
            ));
        }
    }

    if config.telephony.timeout_secs == 0 {
        invalid("telephony.timeout_secs must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &DialdeskConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&DialdeskConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = DialdeskConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_intervals_are_all_reported() {
        let mut config = DialdeskConfig::default();
        config.scheduling.default_retry_interval = 0;
        config.scheduling.retry_intervals = vec![30, 0];
        config.dispatch.poll_interval_secs = 0;
        let messages = messages(&config);
        assert_eq!(messages.len(), 3, "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("retry_intervals[1]")));
        assert!(messages.iter().any(|m| m.contains("default_retry_interval")));
        assert!(messages.iter().any(|m| m.contains("poll_interval_secs")));
    }

    #[test]
    fn retry_intervals_longer_than_a_year_are_rejected() {
        let mut config = DialdeskConfig::default();
        config.scheduling.default_retry_interval = u32::MAX;
        config.scheduling.retry_intervals = vec![60, MAX_RETRY_INTERVAL_MINUTES + 1];
        let messages = messages(&config);
        assert_eq!(messages.len(), 2, "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("default_retry_interval")));
        assert!(messages.iter().any(|m| m.contains("retry_intervals[1]")));
    }

    #[test]
    fn zero_retry_bounds_are_rejected() {
        let mut config = DialdeskConfig::default();
        config.scheduling.max_attempts = Some(0);
        config.scheduling.retry_horizon_hours = Some(0);
        assert_eq!(messages(&config).len(), 2);
    }

    #[test]
    fn telephony_endpoint_must_be_http() {
        let mut config = DialdeskConfig::default();
        config.telephony.endpoint = Some("ftp://calls.example.com".to_string());
        assert!(messages(&config)[0].contains("telephony.endpoint"));

        config.telephony.endpoint = Some("https://calls.example.com".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut config = DialdeskConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(messages(&config)[0].contains("logging.level"));
    }

    #[test]
    fn blank_bearer_token_is_rejected() {
        let mut config = DialdeskConfig::default();
        config.server.bearer_token = Some("  ".to_string());
        assert!(messages(&config)[0].contains("bearer_token"));
    }
}
