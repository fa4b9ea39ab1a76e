// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduling validator.
//!
//! Turns a raw create or update request into a [`CallPlan`], or reports
//! every violated field. Checks that the target resolves, that every
//! supplied instant lies strictly after the submission instant, that a
//! window ends after it starts, and that a retry interval is a positive
//! number of minutes no longer than a year.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use dialdesk_core::{
    CallPlan, CallTarget, CallTiming, CallType, ContactId, FieldErrorCode, GroupId,
    MAX_RETRY_INTERVAL_MINUTES, ValidationErrors,
};

use super::{NumberOrText, non_blank, parse_instant};

/// A scheduled-call request exactly as the client sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCandidate {
    #[serde(default)]
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub group_id: Option<i64>,
    /// `exact` or `window`. Inferred from the timing fields when absent.
    #[serde(default)]
    pub call_type: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub start_time_window: Option<String>,
    #[serde(default)]
    pub end_time_window: Option<String>,
    #[serde(default)]
    pub retry_until_success: Option<bool>,
    #[serde(default)]
    pub retry_interval: Option<NumberOrText>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Values the validator needs from its environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// The submission instant. Every supplied time must be after it.
    pub now: DateTime<Utc>,
    /// Used when the request carries no usable retry interval.
    pub default_retry_interval: u32,
}

impl ValidationContext {
    pub fn new(now: DateTime<Utc>, default_retry_interval: u32) -> Self {
        Self {
            now,
            default_retry_interval,
        }
    }
}

/// Answers whether a call target exists.
pub trait TargetDirectory {
    fn contact_exists(&self, id: ContactId) -> bool;
    fn group_exists(&self, id: GroupId) -> bool;
}

/// A fixed set of existing targets, looked up before validation.
#[derive(Debug, Clone, Default)]
pub struct KnownTargets {
    contacts: HashSet<ContactId>,
    groups: HashSet<GroupId>,
}

impl KnownTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contact(mut self, id: ContactId) -> Self {
        self.contacts.insert(id);
        self
    }

    pub fn with_group(mut self, id: GroupId) -> Self {
        self.groups.insert(id);
        self
    }
}

impl TargetDirectory for KnownTargets {
    fn contact_exists(&self, id: ContactId) -> bool {
        self.contacts.contains(&id)
    }

    fn group_exists(&self, id: GroupId) -> bool {
        self.groups.contains(&id)
    }
}

/// Validate a creation request.
///
/// Returns the normalized plan, or every violation found. Pure: the only
/// inputs are the candidate, the context and the target directory.
pub fn validate(
    candidate: &CallCandidate,
    ctx: &ValidationContext,
    targets: &impl TargetDirectory,
) -> Result<CallPlan, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let target = check_target(candidate, targets, &mut errors);
    let timing = check_timing(candidate, ctx.now, &mut errors);
    let (retry_until_success, retry_interval) = check_retry(candidate, ctx, &mut errors);

    match (target, timing) {
        (Some(target), Some(timing)) if errors.is_empty() => Ok(CallPlan {
            target,
            timing,
            retry_until_success,
            retry_interval,
            script: non_blank(candidate.script.as_deref()),
            notes: non_blank(candidate.notes.as_deref()),
        }),
        _ => Err(errors),
    }
}

/// Validate a partial update against the stored plan.
///
/// The patch is merged over the existing plan and the merged record is
/// validated in full. Switching target or timing mode drops the fields of
/// the old one.
pub fn validate_update(
    existing: &CallPlan,
    patch: &CallCandidate,
    ctx: &ValidationContext,
    targets: &impl TargetDirectory,
) -> Result<CallPlan, ValidationErrors> {
    let merged = merge(candidate_from_plan(existing), patch);
    validate(&merged, ctx, targets)
}

/// The request that would produce `plan`.
pub fn candidate_from_plan(plan: &CallPlan) -> CallCandidate {
    let fmt = |ts: DateTime<Utc>| ts.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    let (scheduled_time, start_time_window, end_time_window) = match plan.timing {
        CallTiming::Exact { scheduled_time } => (Some(fmt(scheduled_time)), None, None),
        CallTiming::Window { start, end } => (None, Some(fmt(start)), Some(fmt(end))),
    };
    CallCandidate {
        contact_id: plan.target.contact_id().map(ContactId::get),
        group_id: plan.target.group_id().map(GroupId::get),
        call_type: Some(plan.timing.call_type().to_string()),
        scheduled_time,
        start_time_window,
        end_time_window,
        retry_until_success: Some(plan.retry_until_success),
        retry_interval: Some(NumberOrText::from(i64::from(plan.retry_interval))),
        script: plan.script.clone(),
        notes: plan.notes.clone(),
    }
}

fn merge(mut base: CallCandidate, patch: &CallCandidate) -> CallCandidate {
    if patch.contact_id.is_some() || patch.group_id.is_some() {
        base.contact_id = patch.contact_id;
        base.group_id = patch.group_id;
    }

    let patch_has_window = patch.start_time_window.is_some() || patch.end_time_window.is_some();
    let patch_type = patch.call_type.clone().or_else(|| {
        match (patch.scheduled_time.is_some(), patch_has_window) {
            (true, false) => Some(CallType::Exact.to_string()),
            (false, true) => Some(CallType::Window.to_string()),
            _ => None,
        }
    });
    if let Some(call_type) = patch_type {
        match parse_call_type(&call_type) {
            Some(CallType::Exact) => {
                base.start_time_window = None;
                base.end_time_window = None;
            }
            Some(CallType::Window) => base.scheduled_time = None,
            None => {}
        }
        base.call_type = Some(call_type);
    }

    overlay(&mut base.scheduled_time, &patch.scheduled_time);
    overlay(&mut base.start_time_window, &patch.start_time_window);
    overlay(&mut base.end_time_window, &patch.end_time_window);
    overlay(&mut base.retry_until_success, &patch.retry_until_success);
    overlay(&mut base.retry_interval, &patch.retry_interval);
    overlay(&mut base.script, &patch.script);
    overlay(&mut base.notes, &patch.notes);
    base
}

fn overlay<T: Clone>(slot: &mut Option<T>, patch: &Option<T>) {
    if let Some(value) = patch {
        *slot = Some(value.clone());
    }
}

fn parse_call_type(raw: &str) -> Option<CallType> {
    raw.trim().to_ascii_lowercase().parse().ok()
}

fn check_target(
    candidate: &CallCandidate,
    targets: &impl TargetDirectory,
    errors: &mut ValidationErrors,
) -> Option<CallTarget> {
    match (candidate.contact_id, candidate.group_id) {
        (Some(_), Some(_)) => {
            errors.push(
                "group_id",
                FieldErrorCode::Conflict,
                "set either contact_id or group_id, not both",
            );
            None
        }
        (None, None) => {
            errors.push(
                "contact_id",
                FieldErrorCode::Required,
                "a contact_id or group_id is required",
            );
            None
        }
        (Some(raw), None) => {
            let id = ContactId(raw);
            if targets.contact_exists(id) {
                Some(CallTarget::Contact(id))
            } else {
                errors.push(
                    "contact_id",
                    FieldErrorCode::NotFound,
                    format!("contact {id} does not exist"),
                );
                None
            }
        }
        (None, Some(raw)) => {
            let id = GroupId(raw);
            if targets.group_exists(id) {
                Some(CallTarget::Group(id))
            } else {
                errors.push(
                    "group_id",
                    FieldErrorCode::NotFound,
                    format!("group {id} does not exist"),
                );
                None
            }
        }
    }
}

/// Parse a required instant. Pushes an error and returns `None` when the
/// field is missing or unparseable.
fn required_instant(
    raw: Option<&str>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<DateTime<Utc>> {
    match non_blank(raw) {
        None => {
            errors.push(field, FieldErrorCode::Required, format!("{field} is required"));
            None
        }
        Some(text) => match parse_instant(&text) {
            Some(ts) => Some(ts),
            None => {
                errors.push(
                    field,
                    FieldErrorCode::Malformed,
                    format!("{field} is not a valid ISO-8601 date-time: '{text}'"),
                );
                None
            }
        },
    }
}

fn check_timing(
    candidate: &CallCandidate,
    now: DateTime<Utc>,
    errors: &mut ValidationErrors,
) -> Option<CallTiming> {
    let has_exact = non_blank(candidate.scheduled_time.as_deref()).is_some();
    let has_window = non_blank(candidate.start_time_window.as_deref()).is_some()
        || non_blank(candidate.end_time_window.as_deref()).is_some();

    let call_type = match non_blank(candidate.call_type.as_deref()) {
        Some(raw) => match parse_call_type(&raw) {
            Some(call_type) => call_type,
            None => {
                errors.push(
                    "call_type",
                    FieldErrorCode::Malformed,
                    format!("call_type must be 'exact' or 'window', got '{raw}'"),
                );
                return None;
            }
        },
        None => match (has_exact, has_window) {
            (true, false) => CallType::Exact,
            (false, true) => CallType::Window,
            (true, true) => {
                errors.push(
                    "call_type",
                    FieldErrorCode::Conflict,
                    "scheduled_time cannot be combined with a time window",
                );
                return None;
            }
            (false, false) => {
                errors.push(
                    "scheduled_time",
                    FieldErrorCode::Required,
                    "scheduled_time or a time window is required",
                );
                return None;
            }
        },
    };

    match call_type {
        CallType::Exact => {
            if has_window {
                errors.push(
                    "start_time_window",
                    FieldErrorCode::Conflict,
                    "time window fields are not allowed for exact calls",
                );
            }
            let scheduled_time =
                required_instant(candidate.scheduled_time.as_deref(), "scheduled_time", errors)?;
            if scheduled_time <= now {
                errors.push(
                    "scheduled_time",
                    FieldErrorCode::NotInFuture,
                    "scheduled_time must be in the future",
                );
            }
            Some(CallTiming::Exact { scheduled_time })
        }
        CallType::Window => {
            if has_exact {
                errors.push(
                    "scheduled_time",
                    FieldErrorCode::Conflict,
                    "scheduled_time is not allowed for window calls",
                );
            }
            let start = required_instant(
                candidate.start_time_window.as_deref(),
                "start_time_window",
                errors,
            );
            let end = required_instant(
                candidate.end_time_window.as_deref(),
                "end_time_window",
                errors,
            );
            if let Some(start) = start
                && start <= now
            {
                errors.push(
                    "start_time_window",
                    FieldErrorCode::NotInFuture,
                    "start_time_window must be in the future",
                );
            }
            if let (Some(start), Some(end)) = (start, end)
                && end <= start
            {
                errors.push(
                    "end_time_window",
                    FieldErrorCode::WindowOrder,
                    "end_time_window must be after start_time_window",
                );
            }
            Some(CallTiming::Window {
                start: start?,
                end: end?,
            })
        }
    }
}

fn check_retry(
    candidate: &CallCandidate,
    ctx: &ValidationContext,
    errors: &mut ValidationErrors,
) -> (bool, u32) {
    let retry_until_success = candidate.retry_until_success.unwrap_or(false);
    let Some(raw) = &candidate.retry_interval else {
        return (retry_until_success, ctx.default_retry_interval);
    };

    // The interval only matters when retries are on; otherwise a bad value
    // falls back to the default instead of failing the request.
    let interval = match raw.as_i64() {
        Some(minutes) => match u32::try_from(minutes) {
            Ok(minutes) if (1..=MAX_RETRY_INTERVAL_MINUTES).contains(&minutes) => Some(minutes),
            _ => {
                if retry_until_success {
                    errors.push(
                        "retry_interval",
                        FieldErrorCode::OutOfRange,
                        format!(
                            "retry_interval must be between 1 and {MAX_RETRY_INTERVAL_MINUTES} minutes"
                        ),
                    );
                }
                None
            }
        },
        None => {
            if retry_until_success {
                errors.push(
                    "retry_interval",
                    FieldErrorCode::Malformed,
                    "retry_interval must be a whole number of minutes",
                );
            }
            None
        }
    };
    (
        retry_until_success,
        interval.unwrap_or(ctx.default_retry_interval),
    )
}
