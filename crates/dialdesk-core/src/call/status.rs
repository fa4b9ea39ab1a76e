// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call status vocabulary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a scheduled call. The wire strings are stable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Waiting for its first (or re-armed) attempt.
    Pending,
    /// Failed at least once; next attempt at `next_retry_at`.
    Retrying,
    Completed,
    Failed,
    Cancelled,
}

impl CallStatus {
    pub const ALL: [CallStatus; 5] = [
        CallStatus::Pending,
        CallStatus::Retrying,
        CallStatus::Completed,
        CallStatus::Failed,
        CallStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Retrying => "retrying",
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
            CallStatus::Cancelled => "cancelled",
        }
    }

    /// No automatic transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallStatus::Completed | CallStatus::Failed | CallStatus::Cancelled
        )
    }

    /// Whether the dispatcher may still attempt this call.
    pub fn accepts_outcomes(&self) -> bool {
        matches!(self, CallStatus::Pending | CallStatus::Retrying)
    }

    pub fn is_cancellable(&self) -> bool {
        self.accepts_outcomes()
    }

    /// `failed` calls may be re-armed by an edit; `completed` and
    /// `cancelled` are closed for good.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            CallStatus::Pending | CallStatus::Retrying | CallStatus::Failed
        )
    }

    /// Statuses other than `self` reachable in a single transition.
    pub fn successors(&self) -> &'static [CallStatus] {
        match self {
            CallStatus::Pending => &[
                CallStatus::Completed,
                CallStatus::Failed,
                CallStatus::Retrying,
                CallStatus::Cancelled,
            ],
            CallStatus::Retrying => &[
                CallStatus::Completed,
                CallStatus::Failed,
                CallStatus::Cancelled,
                CallStatus::Pending,
            ],
            CallStatus::Failed => &[CallStatus::Pending],
            CallStatus::Completed | CallStatus::Cancelled => &[],
        }
    }
}
