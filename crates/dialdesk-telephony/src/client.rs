// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the telephony provider.
//!
//! Provides [`TelephonyClient`] which handles authentication, the request
//! timeout and error mapping. Placements are never retried here: a retry
//! could ring the callee twice.

use std::time::Duration;

use dialdesk_core::{CallReport, DialdeskError, PlaceCallRequest};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{CallRequest, CallResponse, ProviderError};

/// HTTP client for one provider endpoint.
#[derive(Debug, Clone)]
pub struct TelephonyClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl TelephonyClient {
    /// Creates a client for `base_url`, sending `api_key` as a bearer token
    /// when given.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, DialdeskError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                    DialdeskError::Config(format!("invalid telephony API key header value: {e}"))
                })?,
            );
        }
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DialdeskError::Telephony {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Places one call and waits for the provider's report.
    pub async fn place_call(&self, request: &PlaceCallRequest) -> Result<CallReport, DialdeskError> {
        let url = format!("{}/calls", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&CallRequest::from(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, contact_id = %request.contact_id, "telephony response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ProviderError>(&body) {
                Ok(err) => err.error,
                Err(_) => body,
            };
            return Err(DialdeskError::Telephony {
                message: format!("provider returned {status}: {detail}"),
                source: None,
            });
        }

        let body: CallResponse = response.json().await.map_err(|e| DialdeskError::Telephony {
            message: format!("failed to parse provider response: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(body.into_report())
    }

    /// Probes `GET {endpoint}/health`.
    pub async fn health(&self) -> Result<(), DialdeskError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DialdeskError::Telephony {
                message: format!("provider health returned {status}"),
                source: None,
            })
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> DialdeskError {
        if e.is_timeout() {
            DialdeskError::Timeout {
                duration: self.timeout,
            }
        } else {
            DialdeskError::Telephony {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}
