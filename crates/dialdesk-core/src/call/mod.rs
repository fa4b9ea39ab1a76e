// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The scheduled call record and its lifecycle.
//!
//! A [`ScheduledCall`] is built from a validated [`CallPlan`] and only changes
//! status through the transitions in [`lifecycle`]: dispatch outcomes,
//! cancellation, and user edits. Its fields are private so no other code path
//! can assign a status directly.

pub mod lifecycle;
pub mod retry;
pub mod status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{CallId, ContactId, GroupId};

pub use lifecycle::{CallOutcome, TransitionError, apply_outcome};
pub use retry::{
    MAX_RETRY_INTERVAL_MINUTES, RetryPolicy, compute_next_retry, is_storable,
    latest_storable_instant,
};
pub use status::CallStatus;

/// Who a call is placed to. Exactly one target per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallTarget {
    Contact(ContactId),
    Group(GroupId),
}

impl CallTarget {
    pub fn contact_id(&self) -> Option<ContactId> {
        match self {
            CallTarget::Contact(id) => Some(*id),
            CallTarget::Group(_) => None,
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            CallTarget::Group(id) => Some(*id),
            CallTarget::Contact(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, CallTarget::Group(_))
    }
}

/// Wire name of the timing mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Exact,
    Window,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Exact => "exact",
            CallType::Window => "window",
        }
    }
}

/// When the first attempt should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call_type", rename_all = "lowercase")]
pub enum CallTiming {
    /// A single absolute dispatch instant.
    Exact { scheduled_time: DateTime<Utc> },
    /// Any instant within `[start, end]`; `start < end`.
    Window {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl CallTiming {
    pub fn call_type(&self) -> CallType {
        match self {
            CallTiming::Exact { .. } => CallType::Exact,
            CallTiming::Window { .. } => CallType::Window,
        }
    }

    /// The first instant at which the call may be dispatched.
    pub fn earliest(&self) -> DateTime<Utc> {
        match self {
            CallTiming::Exact { scheduled_time } => *scheduled_time,
            CallTiming::Window { start, .. } => *start,
        }
    }

    pub fn scheduled_time(&self) -> Option<DateTime<Utc>> {
        match self {
            CallTiming::Exact { scheduled_time } => Some(*scheduled_time),
            CallTiming::Window { .. } => None,
        }
    }

    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self {
            CallTiming::Window { start, end } => Some((*start, *end)),
            CallTiming::Exact { .. } => None,
        }
    }
}

/// The user-controlled part of a scheduled call, as produced by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPlan {
    pub target: CallTarget,
    pub timing: CallTiming,
    pub retry_until_success: bool,
    /// Minutes between attempts after a failure. Always positive.
    pub retry_interval: u32,
    pub script: Option<String>,
    pub notes: Option<String>,
}

/// Every persisted field of a scheduled call, used to rebuild a record
/// loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub id: CallId,
    pub plan: CallPlan,
    pub status: CallStatus,
    pub call_attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One scheduled call, individual or group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCall {
    id: CallId,
    plan: CallPlan,
    status: CallStatus,
    call_attempts: u32,
    last_attempt_at: Option<DateTime<Utc>>,
    next_retry_at: Option<DateTime<Utc>>,
    revision: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ScheduledCall {
    /// A freshly created call: `pending`, no attempts, revision 1.
    pub fn pending(id: CallId, plan: CallPlan, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            plan,
            status: CallStatus::Pending,
            call_attempts: 0,
            last_attempt_at: None,
            next_retry_at: None,
            revision: 1,
            created_at,
            updated_at: created_at,
        }
    }

    /// Rebuild a call from its stored fields.
    pub fn restore(record: CallRecord) -> Self {
        Self {
            id: record.id,
            plan: record.plan,
            status: record.status,
            call_attempts: record.call_attempts,
            last_attempt_at: record.last_attempt_at,
            next_retry_at: record.next_retry_at,
            revision: record.revision,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn plan(&self) -> &CallPlan {
        &self.plan
    }

    pub fn target(&self) -> CallTarget {
        self.plan.target
    }

    pub fn timing(&self) -> CallTiming {
        self.plan.timing
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn call_attempts(&self) -> u32 {
        self.call_attempts
    }

    pub fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.last_attempt_at
    }

    pub fn next_retry_at(&self) -> Option<DateTime<Utc>> {
        self.next_retry_at
    }

    /// Optimistic concurrency token. Bumped by storage on every write.
    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
