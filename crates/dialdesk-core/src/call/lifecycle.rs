// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call status state machine.
//!
//! All status changes go through [`ScheduledCall::apply_outcome`],
//! [`ScheduledCall::cancel`] and [`ScheduledCall::apply_edit`]. Each returns
//! a new record and leaves the input untouched, so a caller that loses a
//! compare-and-set write can simply drop the result.
//!
//! | from | dispatch success | dispatch failure | cancel | edit |
//! |---|---|---|---|---|
//! | pending | completed | retrying / failed | cancelled | pending |
//! | retrying | completed | retrying / failed | cancelled | pending |
//! | failed | - | - | - | pending |
//! | completed | - | - | - | - |
//! | cancelled | - | - | - | - |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::retry::next_after;
use super::{CallPlan, CallStatus, CallTiming, RetryPolicy, ScheduledCall};

/// Result of one dispatch attempt, as reported by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CallOutcome {
    Success,
    /// The provider failed to connect the call. `reason` is opaque text
    /// supplied by the dispatcher.
    Failure { reason: Option<String> },
}

impl CallOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        CallOutcome::Failure {
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            CallOutcome::Success => None,
            CallOutcome::Failure { reason } => reason.as_deref(),
        }
    }
}

/// A lifecycle change that is not legal from the call's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot record a dispatch outcome for a {status} call")]
    NotDispatchable { status: CallStatus },
    #[error("cannot cancel a {status} call")]
    NotCancellable { status: CallStatus },
    #[error("cannot edit a {status} call")]
    NotEditable { status: CallStatus },
}

impl TransitionError {
    /// Status of the call when the change was rejected.
    pub fn status(&self) -> CallStatus {
        match self {
            TransitionError::NotDispatchable { status }
            | TransitionError::NotCancellable { status }
            | TransitionError::NotEditable { status } => *status,
        }
    }
}

impl ScheduledCall {
    /// Record one dispatch attempt made at `attempted_at`.
    ///
    /// Every accepted outcome increments `call_attempts` by one and sets
    /// `last_attempt_at`. Success completes the call. Failure moves a
    /// retry-until-success call to `retrying` with the next fixed-interval
    /// attempt, unless `policy` forbids another attempt, in which case the
    /// call fails. Outcomes for calls that are no longer dispatchable are
    /// rejected so a duplicate report never double-counts.
    pub fn apply_outcome(
        &self,
        outcome: &CallOutcome,
        attempted_at: DateTime<Utc>,
        policy: &RetryPolicy,
    ) -> Result<ScheduledCall, TransitionError> {
        if !self.status.accepts_outcomes() {
            return Err(TransitionError::NotDispatchable {
                status: self.status,
            });
        }

        let mut next = self.clone();
        next.call_attempts = self.call_attempts.saturating_add(1);
        next.last_attempt_at = Some(attempted_at);
        next.updated_at = attempted_at;

        match outcome {
            CallOutcome::Success => {
                next.status = CallStatus::Completed;
                next.next_retry_at = None;
            }
            CallOutcome::Failure { .. } => {
                let retry_at = next_after(attempted_at, self.plan.retry_interval);
                let retry = self.plan.retry_until_success
                    && policy.allows_retry(
                        next.call_attempts,
                        self.plan.timing.earliest(),
                        retry_at,
                    );
                if retry {
                    next.status = CallStatus::Retrying;
                    next.next_retry_at = Some(retry_at);
                } else {
                    next.status = CallStatus::Failed;
                    next.next_retry_at = None;
                }
            }
        }
        Ok(next)
    }

    /// User cancellation. Attempt counters are left alone.
    pub fn cancel(&self, now: DateTime<Utc>) -> Result<ScheduledCall, TransitionError> {
        if !self.status.is_cancellable() {
            return Err(TransitionError::NotCancellable {
                status: self.status,
            });
        }
        let mut next = self.clone();
        next.status = CallStatus::Cancelled;
        next.next_retry_at = None;
        next.updated_at = now;
        Ok(next)
    }

    /// Replace the plan with an edited one and re-arm the call to `pending`.
    ///
    /// `call_attempts` and `last_attempt_at` are preserved.
    pub fn apply_edit(
        &self,
        plan: CallPlan,
        now: DateTime<Utc>,
    ) -> Result<ScheduledCall, TransitionError> {
        if !self.status.is_editable() {
            return Err(TransitionError::NotEditable {
                status: self.status,
            });
        }
        let mut next = self.clone();
        next.plan = plan;
        next.status = CallStatus::Pending;
        next.next_retry_at = None;
        next.updated_at = now;
        Ok(next)
    }

    /// When the dispatcher should next attempt this call, if at all.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            CallStatus::Pending => Some(self.plan.timing.earliest()),
            CallStatus::Retrying => self.next_retry_at,
            _ => None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at().is_some_and(|due| due <= now)
    }

    /// A pending window call whose window closed before any attempt.
    pub fn window_missed(&self, now: DateTime<Utc>) -> bool {
        match (self.status, self.plan.timing) {
            (CallStatus::Pending, CallTiming::Window { end, .. }) => now > end,
            _ => false,
        }
    }
}

/// Free-function form of [`ScheduledCall::apply_outcome`].
pub fn apply_outcome(
    call: &ScheduledCall,
    outcome: &CallOutcome,
    now: DateTime<Utc>,
    policy: &RetryPolicy,
) -> Result<ScheduledCall, TransitionError> {
    call.apply_outcome(outcome, now, policy)
}
