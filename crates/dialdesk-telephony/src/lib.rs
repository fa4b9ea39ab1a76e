// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP telephony provider adapter for Dialdesk.
//!
//! This crate implements [`TelephonyAdapter`] over a provider that accepts
//! `POST {endpoint}/calls` and answers with the call's final report. With no
//! endpoint configured every placement is refused.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use dialdesk_config::model::TelephonyConfig;
use dialdesk_core::{
    AdapterType, CallReport, DialdeskError, HealthStatus, PlaceCallRequest, PluginAdapter,
    TelephonyAdapter,
};
use tracing::{debug, info, warn};

use crate::client::TelephonyClient;

/// Telephony adapter backed by an HTTP provider.
pub struct HttpTelephony {
    client: Option<TelephonyClient>,
}

impl HttpTelephony {
    /// Builds the adapter from configuration. A missing endpoint yields an
    /// adapter that refuses calls rather than an error, so the API can still
    /// serve CRUD traffic.
    pub fn new(config: &TelephonyConfig) -> Result<Self, DialdeskError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        let client = match endpoint {
            Some(endpoint) => {
                let client = TelephonyClient::new(
                    endpoint,
                    config.api_key.as_deref(),
                    Duration::from_secs(config.timeout_secs),
                )?;
                info!(endpoint, timeout_secs = config.timeout_secs, "telephony provider configured");
                Some(client)
            }
            None => {
                warn!("no telephony endpoint configured; outbound calls will be refused");
                None
            }
        };
        Ok(Self { client })
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl PluginAdapter for HttpTelephony {
    fn name(&self) -> &str {
        "http-telephony"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Telephony
    }

    async fn health_check(&self) -> Result<HealthStatus, DialdeskError> {
        let Some(client) = &self.client else {
            return Ok(HealthStatus::Degraded(
                "no telephony endpoint configured".to_string(),
            ));
        };
        match client.health().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), DialdeskError> {
        Ok(())
    }
}

#[async_trait]
impl TelephonyAdapter for HttpTelephony {
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<CallReport, DialdeskError> {
        let client = self.client.as_ref().ok_or_else(|| DialdeskError::Telephony {
            message: "no telephony endpoint configured".to_string(),
            source: None,
        })?;
        debug!(
            contact_id = %request.contact_id,
            scheduled_call = ?request.scheduled_call.map(|id| id.get()),
            "placing call"
        );
        client.place_call(request).await
    }
}
