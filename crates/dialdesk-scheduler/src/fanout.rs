// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group call fan-out.
//!
//! A group call keeps one schedule record. At dispatch time the group's
//! current members are each called once and every member result is written
//! to that contact's dialog history. The record's own status tracks the
//! batch: it succeeds when at least one member call connected.

use chrono::{DateTime, Utc};

use dialdesk_core::{
    CallOutcome, CallReport, ContactId, DialdeskError, DialogDraft, DialogMessage, DialogRole,
};

/// Result of calling one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberResult {
    pub contact_id: ContactId,
    pub outcome: CallOutcome,
    /// Provider call id, when the provider accepted the call.
    pub call_sid: Option<String>,
}

impl MemberResult {
    pub fn from_placement(
        contact_id: ContactId,
        placement: &Result<CallReport, DialdeskError>,
    ) -> Self {
        Self {
            contact_id,
            outcome: placement_outcome(placement),
            call_sid: placement.as_ref().ok().map(|r| r.call_sid.clone()),
        }
    }
}

/// Interpret one provider placement. An unanswered call and a provider
/// error are both failed attempts.
pub fn placement_outcome(placement: &Result<CallReport, DialdeskError>) -> CallOutcome {
    match placement {
        Ok(report) if report.answered => CallOutcome::Success,
        Ok(report) => CallOutcome::failure(
            report
                .failure_reason
                .clone()
                .unwrap_or_else(|| "no answer".to_string()),
        ),
        Err(err) => CallOutcome::failure(err.to_string()),
    }
}

/// Collapse member results into the group call's outcome.
pub fn batch_outcome(results: &[MemberResult]) -> CallOutcome {
    if results.is_empty() {
        return CallOutcome::failure("group has no members");
    }
    let connected = results.iter().filter(|r| r.outcome.is_success()).count();
    if connected > 0 {
        CallOutcome::Success
    } else {
        CallOutcome::failure(format!("all {} member calls failed", results.len()))
    }
}

/// The dialog entry recorded for one placement.
pub fn placement_dialog(
    placement: &Result<CallReport, DialdeskError>,
    attempted_at: DateTime<Utc>,
) -> DialogDraft {
    match placement {
        Ok(report) if report.answered => DialogDraft {
            date: attempted_at,
            messages: report.messages.clone(),
            transcript: report.transcript.clone(),
        },
        _ => {
            let reason = placement_outcome(placement)
                .reason()
                .unwrap_or("call failed")
                .to_string();
            DialogDraft {
                date: attempted_at,
                messages: vec![DialogMessage {
                    role: DialogRole::Agent,
                    text: format!("Call not connected: {reason}"),
                }],
                transcript: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report(answered: bool) -> CallReport {
        CallReport {
            call_sid: "CA100".to_string(),
            answered,
            messages: vec![DialogMessage {
                role: DialogRole::Client,
                text: "Hello?".to_string(),
            }],
            transcript: Some("Hello?".to_string()),
            failure_reason: if answered {
                None
            } else {
                Some("busy".to_string())
            },
        }
    }

    fn member(id: i64, success: bool) -> MemberResult {
        MemberResult {
            contact_id: ContactId(id),
            outcome: if success {
                CallOutcome::Success
            } else {
                CallOutcome::failure("busy")
            },
            call_sid: None,
        }
    }

    #[test]
    fn empty_group_fails_the_batch() {
        let outcome = batch_outcome(&[]);
        assert_eq!(outcome.reason(), Some("group has no members"));
    }

    #[test]
    fn one_connected_member_completes_the_batch() {
        let outcome = batch_outcome(&[member(1, false), member(2, true), member(3, false)]);
        assert!(outcome.is_success());
    }

    #[test]
    fn all_failed_members_fail_the_batch() {
        let outcome = batch_outcome(&[member(1, false), member(2, false)]);
        assert_eq!(outcome.reason(), Some("all 2 member calls failed"));
    }

    #[test]
    fn placements_map_to_outcomes() {
        assert!(placement_outcome(&Ok(report(true))).is_success());
        assert_eq!(placement_outcome(&Ok(report(false))).reason(), Some("busy"));
        let err: Result<CallReport, DialdeskError> = Err(DialdeskError::Telephony {
            message: "provider unreachable".to_string(),
            source: None,
        });
        assert_eq!(
            placement_outcome(&err).reason(),
            Some("telephony error: provider unreachable")
        );
        let result = MemberResult::from_placement(ContactId(4), &Ok(report(false)));
        assert_eq!(result.call_sid.as_deref(), Some("CA100"));
    }

    #[test]
    fn dialogs_record_conversation_or_failure() {
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        let answered = placement_dialog(&Ok(report(true)), at);
        assert_eq!(answered.transcript.as_deref(), Some("Hello?"));
        assert_eq!(answered.date, at);

        let missed = placement_dialog(&Ok(report(false)), at);
        assert_eq!(missed.messages[0].text, "Call not connected: busy");
        assert!(missed.transcript.is_none());
    }
}
