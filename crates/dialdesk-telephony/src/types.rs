// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the telephony provider's HTTP API.

use serde::{Deserialize, Serialize};

use dialdesk_core::{CallReport, DialogMessage, PlaceCallRequest};

/// Body of `POST {endpoint}/calls`.
#[derive(Debug, Clone, Serialize)]
pub struct CallRequest<'a> {
    pub to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<&'a str>,
    pub contact_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_call_id: Option<i64>,
}

impl<'a> From<&'a PlaceCallRequest> for CallRequest<'a> {
    fn from(request: &'a PlaceCallRequest) -> Self {
        Self {
            to: &request.phone,
            script: request.script.as_deref(),
            contact_id: request.contact_id.get(),
            scheduled_call_id: request.scheduled_call.map(|id| id.get()),
        }
    }
}

/// Provider response for a placed call.
#[derive(Debug, Clone, Deserialize)]
pub struct CallResponse {
    pub call_sid: String,
    /// Final call status, e.g. `completed`, `no-answer`, `busy`.
    pub status: String,
    #[serde(default)]
    pub messages: Vec<DialogMessage>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CallResponse {
    pub fn answered(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "completed" | "answered"
        )
    }

    pub fn into_report(self) -> CallReport {
        let answered = self.answered();
        let failure_reason = if answered {
            None
        } else {
            Some(self.error.unwrap_or_else(|| self.status.replace('-', " ")))
        };
        CallReport {
            call_sid: self.call_sid,
            answered,
            messages: self.messages,
            transcript: self.transcript,
            failure_reason,
        }
    }
}

/// Error body returned by the provider on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderError {
    #[serde(alias = "detail")]
    pub error: String,
}
