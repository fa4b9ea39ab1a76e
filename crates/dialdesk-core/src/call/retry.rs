// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-interval retry policy.
//!
//! After a failed attempt the next attempt is due `retry_interval` minutes
//! after the last one. There is no backoff and no jitter. Retries are
//! unbounded unless a [`RetryPolicy`] sets an attempt cap or a horizon.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::ScheduledCall;

/// Longest accepted retry interval: one year, in minutes.
pub const MAX_RETRY_INTERVAL_MINUTES: u32 = 525_600;

/// Latest instant that round-trips through an RFC 3339 timestamp, which
/// allows four-digit years only.
pub fn latest_storable_instant() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_micro_opt(23, 59, 59, 999_999))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whether `ts` can be written and read back as an RFC 3339 timestamp.
pub fn is_storable(ts: DateTime<Utc>) -> bool {
    use chrono::Datelike;
    ts.year() >= 0 && ts <= latest_storable_instant()
}

/// Optional bounds on retry-until-success calls.
///
/// The default policy is unbounded: a call retries until it succeeds or is
/// cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts after which a failure is final.
    pub max_attempts: Option<u32>,
    /// How long after the call's first dispatchable instant retries may
    /// still be scheduled.
    pub horizon: Option<Duration>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn new(max_attempts: Option<u32>, horizon: Option<Duration>) -> Self {
        Self {
            max_attempts,
            horizon,
        }
    }

    /// Build from configuration values; a horizon is given in hours.
    pub fn from_limits(max_attempts: Option<u32>, retry_horizon_hours: Option<u32>) -> Self {
        Self {
            max_attempts,
            horizon: retry_horizon_hours.map(|h| Duration::hours(i64::from(h))),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.horizon.is_none()
    }

    /// Whether another attempt may be scheduled after `attempts` attempts,
    /// with the next one due at `next_at`. `anchor` is the call's earliest
    /// dispatchable instant.
    pub fn allows_retry(
        &self,
        attempts: u32,
        anchor: DateTime<Utc>,
        next_at: DateTime<Utc>,
    ) -> bool {
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return false;
            }
        }
        if let Some(horizon) = self.horizon {
            match anchor.checked_add_signed(horizon) {
                Some(deadline) if next_at > deadline => return false,
                _ => {}
            }
        }
        true
    }
}

/// Instant of the next attempt: `last_attempt_at + retry_interval` minutes,
/// falling back to `now` when the call was never attempted.
///
/// Depends only on the call's stored fields (and `now` for a never-attempted
/// call), so recomputing it is idempotent.
pub fn compute_next_retry(call: &ScheduledCall, now: DateTime<Utc>) -> DateTime<Utc> {
    let base = call.last_attempt_at().unwrap_or(now);
    next_after(base, call.plan().retry_interval)
}

/// Clamped to [`latest_storable_instant`].
pub(crate) fn next_after(base: DateTime<Utc>, interval_minutes: u32) -> DateTime<Utc> {
    let latest = latest_storable_instant();
    base.checked_add_signed(Duration::minutes(i64::from(interval_minutes)))
        .map_or(latest, |next| next.min(latest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{CallPlan, CallRecord, CallStatus, CallTarget, CallTiming};
    use crate::types::{CallId, ContactId};
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, h, m, s).unwrap()
    }

    fn call_with(last_attempt_at: Option<DateTime<Utc>>, retry_interval: u32) -> ScheduledCall {
        ScheduledCall::restore(CallRecord {
            id: CallId(1),
            plan: CallPlan {
                target: CallTarget::Contact(ContactId(42)),
                timing: CallTiming::Exact {
                    scheduled_time: at(10, 0, 0),
                },
                retry_until_success: true,
                retry_interval,
                script: None,
                notes: None,
            },
            status: CallStatus::Retrying,
            call_attempts: 1,
            last_attempt_at,
            next_retry_at: None,
            revision: 2,
            created_at: at(8, 0, 0),
            updated_at: at(10, 0, 5),
        })
    }

    #[test]
    fn next_retry_is_fixed_interval_from_last_attempt() {
        let call = call_with(Some(at(10, 0, 5)), 60);
        assert_eq!(compute_next_retry(&call, at(10, 30, 0)), at(11, 0, 5));
    }

    #[test]
    fn next_retry_ignores_now_once_attempted() {
        let call = call_with(Some(at(10, 0, 5)), 30);
        let first = compute_next_retry(&call, at(10, 1, 0));
        let second = compute_next_retry(&call, at(23, 59, 0));
        assert_eq!(first, second);
    }

    #[test]
    fn never_attempted_call_retries_from_now() {
        let call = call_with(None, 120);
        assert_eq!(compute_next_retry(&call, at(9, 0, 0)), at(11, 0, 0));
    }

    #[test]
    fn huge_interval_is_clamped_to_a_storable_instant() {
        let call = call_with(Some(at(10, 0, 5)), u32::MAX);
        let next = compute_next_retry(&call, at(10, 1, 0));
        assert_eq!(next, latest_storable_instant());
        assert!(is_storable(next));
        assert!(next.to_rfc3339().starts_with("9999-12-31T23:59:59"));
    }

    #[test]
    fn storable_range_is_four_digit_years() {
        assert!(is_storable(at(10, 0, 0)));
        assert!(is_storable(latest_storable_instant()));
        assert!(!is_storable(
            latest_storable_instant() + Duration::microseconds(1)
        ));
        assert!(!is_storable(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn unbounded_policy_always_allows() {
        let policy = RetryPolicy::unbounded();
        assert!(policy.is_unbounded());
        assert!(policy.allows_retry(10_000, at(0, 0, 0), DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn attempt_cap_stops_retries() {
        let policy = RetryPolicy::new(Some(3), None);
        assert!(policy.allows_retry(2, at(10, 0, 0), at(11, 0, 0)));
        assert!(!policy.allows_retry(3, at(10, 0, 0), at(11, 0, 0)));
    }

    #[test]
    fn horizon_stops_retries_past_deadline() {
        let policy = RetryPolicy::from_limits(None, Some(2));
        assert!(policy.allows_retry(1, at(10, 0, 0), at(12, 0, 0)));
        assert!(!policy.allows_retry(1, at(10, 0, 0), at(12, 0, 1)));
    }
}
