// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later wins: compiled defaults, `/etc/dialdesk/dialdesk.toml`,
//! `~/.config/dialdesk/dialdesk.toml`, `./dialdesk.toml`, `DIALDESK_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DialdeskConfig;

pub const SYSTEM_CONFIG: &str = "/etc/dialdesk/dialdesk.toml";
pub const LOCAL_CONFIG: &str = "dialdesk.toml";

/// Top-level sections, used to map `DIALDESK_SECTION_KEY` to `section.key`.
const SECTIONS: &[&str] = &[
    "logging",
    "server",
    "storage",
    "scheduling",
    "dispatch",
    "telephony",
];

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dialdesk").join("dialdesk.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<DialdeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<DialdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DialdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DialdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DialdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DialdeskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `DIALDESK_SERVER_BEARER_TOKEN` maps to `server.bearer_token`.
fn env_provider() -> Env {
    Env::prefixed("DIALDESK_").map(|key| map_env_key(key.as_str()).into())
}

/// figment hands over the prefix-stripped key in its original case.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
        {
            return format!("{section}.{field}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_case_env_keys_are_mapped() {
        assert_eq!(map_env_key("SERVER_BEARER_TOKEN"), "server.bearer_token");
        assert_eq!(map_env_key("TELEPHONY_API_KEY"), "telephony.api_key");
        assert_eq!(map_env_key("DISPATCH_BATCH_SIZE"), "dispatch.batch_size");
    }

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("server_bearer_token"), "server.bearer_token");
        assert_eq!(
            map_env_key("scheduling_default_retry_interval"),
            "scheduling.default_retry_interval"
        );
        assert_eq!(map_env_key("dispatch_poll_interval_secs"), "dispatch.poll_interval_secs");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("agent_name"), "agent_name");
    }
}
