// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process dispatcher.
//!
//! Polls for due calls, places them through the telephony adapter, and
//! feeds each outcome back through the state machine. Saves are
//! compare-and-set on the revision read before dialing: if a user cancelled
//! or edited the call in the meantime the attempt's state change is dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use dialdesk_config::model::{DispatchConfig, SchedulingConfig};
use dialdesk_core::{
    CallId, CallOutcome, CallReport, CallStatus, CallTarget, Contact, ContactId, DialdeskError,
    Dialog, GroupId, PlaceCallRequest, RetryPolicy, ScheduledCall, StorageAdapter,
    TelephonyAdapter,
};

use crate::fanout::{MemberResult, batch_outcome, placement_dialog, placement_outcome};
use crate::template;

/// Failure reason recorded when a window closed before the first attempt.
pub const WINDOW_ELAPSED: &str = "dispatch window elapsed";

/// Counts from one polling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub due: usize,
    pub completed: usize,
    pub retrying: usize,
    pub failed: usize,
    /// Attempts whose result was dropped because the record changed.
    pub discarded: usize,
}

/// Result of an immediate, unscheduled call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmediateCall {
    pub call_sid: String,
    pub answered: bool,
    pub dialog: Dialog,
}

/// Places due calls and records their outcomes.
pub struct DispatchRunner {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    telephony: Arc<dyn TelephonyAdapter + Send + Sync>,
    policy: RetryPolicy,
    batch_size: usize,
}

impl DispatchRunner {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        telephony: Arc<dyn TelephonyAdapter + Send + Sync>,
        scheduling: &SchedulingConfig,
        dispatch: &DispatchConfig,
    ) -> Self {
        Self {
            storage,
            telephony,
            policy: RetryPolicy::from_limits(
                scheduling.max_attempts,
                scheduling.retry_horizon_hours,
            ),
            batch_size: dispatch.batch_size,
        }
    }

    /// Dispatch every call due at `now`, up to the batch size.
    ///
    /// A storage failure aborts the pass; calls not yet reached stay due
    /// and are picked up by the next one.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickSummary, DialdeskError> {
        let due = self.storage.list_due_calls(now, self.batch_size).await?;
        let mut summary = TickSummary {
            due: due.len(),
            ..TickSummary::default()
        };

        for call in &due {
            match self.dispatch_call(call, now).await? {
                Some(saved) => match saved.status() {
                    CallStatus::Completed => summary.completed += 1,
                    CallStatus::Retrying => summary.retrying += 1,
                    CallStatus::Failed => summary.failed += 1,
                    _ => {}
                },
                None => summary.discarded += 1,
            }
        }
        Ok(summary)
    }

    /// Attempt one call and save the resulting transition.
    ///
    /// Returns `None` when the record changed while the call was being
    /// placed and the attempt was discarded.
    pub async fn dispatch_call(
        &self,
        call: &ScheduledCall,
        attempted_at: DateTime<Utc>,
    ) -> Result<Option<ScheduledCall>, DialdeskError> {
        let outcome = if call.window_missed(attempted_at) {
            warn!(
                call_id = %call.id(),
                "call window closed before dispatch; recording a failed attempt"
            );
            CallOutcome::failure(WINDOW_ELAPSED)
        } else {
            match call.target() {
                CallTarget::Contact(id) => self.call_contact(call, id, attempted_at).await?,
                CallTarget::Group(id) => self.call_group(call, id, attempted_at).await?,
            }
        };

        let next = match call.apply_outcome(&outcome, attempted_at, &self.policy) {
            Ok(next) => next,
            Err(err) => {
                info!(call_id = %call.id(), error = %err, "attempt discarded");
                return Ok(None);
            }
        };

        match self.storage.save_call(&next).await {
            Ok(saved) => {
                info!(
                    call_id = %saved.id(),
                    status = %saved.status(),
                    attempts = saved.call_attempts(),
                    revision = saved.revision(),
                    "dispatch outcome recorded"
                );
                Ok(Some(saved))
            }
            Err(DialdeskError::Conflict {
                call_id,
                expected_revision,
            }) => {
                info!(
                    call_id = %call_id,
                    expected_revision,
                    "call changed during dispatch; attempt result discarded"
                );
                Ok(None)
            }
            Err(DialdeskError::NotFound { .. }) => {
                info!(call_id = %call.id(), "call deleted during dispatch; attempt result discarded");
                Ok(None)
            }
            Err(err) => {
                error!(call_id = %call.id(), error = %err, "failed to save dispatch outcome");
                Err(err)
            }
        }
    }

    /// Place a call right now without scheduling it. The report is
    /// appended to the contact's dialogs.
    pub async fn place_immediate(
        &self,
        contact_id: ContactId,
        script: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ImmediateCall, DialdeskError> {
        let contact = self
            .storage
            .get_contact(contact_id)
            .await?
            .ok_or(DialdeskError::NotFound {
                entity: "contact",
                id: contact_id.get(),
            })?;

        let placement = self.place(&contact, script.as_deref(), None).await;
        let draft = placement_dialog(&placement, now);
        let report = placement?;
        let dialog = self.storage.append_dialog(contact.id, &draft).await?;
        info!(
            contact_id = %contact.id,
            call_sid = %report.call_sid,
            answered = report.answered,
            "immediate call placed"
        );
        Ok(ImmediateCall {
            call_sid: report.call_sid,
            answered: report.answered,
            dialog,
        })
    }

    /// Poll until `cancel` fires.
    pub async fn run(self: Arc<Self>, poll_interval: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval_secs = poll_interval.as_secs(),
            batch_size = self.batch_size,
            "dispatch loop started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick(Utc::now()).await {
                        Ok(summary) if summary.due > 0 => info!(
                            due = summary.due,
                            completed = summary.completed,
                            retrying = summary.retrying,
                            failed = summary.failed,
                            discarded = summary.discarded,
                            "dispatch pass complete"
                        ),
                        Ok(_) => debug!("no calls due"),
                        Err(err) => error!(error = %err, "dispatch pass aborted"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("dispatch loop shutting down");
                    break;
                }
            }
        }
    }

    async fn call_contact(
        &self,
        call: &ScheduledCall,
        contact_id: ContactId,
        attempted_at: DateTime<Utc>,
    ) -> Result<CallOutcome, DialdeskError> {
        let Some(contact) = self.storage.get_contact(contact_id).await? else {
            return Ok(CallOutcome::failure(format!(
                "contact {contact_id} no longer exists"
            )));
        };
        let placement = self
            .place(&contact, call.plan().script.as_deref(), Some(call.id()))
            .await;
        self.record_dialog(call.id(), contact.id, &placement, attempted_at)
            .await;
        Ok(placement_outcome(&placement))
    }

    /// Call every current member once. Membership is read now, not when
    /// the call was scheduled.
    async fn call_group(
        &self,
        call: &ScheduledCall,
        group_id: GroupId,
        attempted_at: DateTime<Utc>,
    ) -> Result<CallOutcome, DialdeskError> {
        let members = self.storage.list_group_contacts(group_id).await?;
        let mut results = Vec::with_capacity(members.len());
        for contact in &members {
            let placement = self
                .place(contact, call.plan().script.as_deref(), Some(call.id()))
                .await;
            self.record_dialog(call.id(), contact.id, &placement, attempted_at)
                .await;
            results.push(MemberResult::from_placement(contact.id, &placement));
        }
        let outcome = batch_outcome(&results);
        debug!(
            call_id = %call.id(),
            group_id = %group_id,
            members = results.len(),
            connected = results.iter().filter(|r| r.outcome.is_success()).count(),
            "group fan-out finished"
        );
        Ok(outcome)
    }

    /// The call has already been placed, so a failed dialog write must not
    /// stop the attempt from being recorded.
    async fn record_dialog(
        &self,
        call_id: CallId,
        contact_id: ContactId,
        placement: &Result<CallReport, DialdeskError>,
        attempted_at: DateTime<Utc>,
    ) {
        let draft = placement_dialog(placement, attempted_at);
        if let Err(err) = self.storage.append_dialog(contact_id, &draft).await {
            error!(
                call_id = %call_id,
                contact_id = %contact_id,
                error = %err,
                "failed to record dialog for placed call"
            );
        }
    }

    async fn place(
        &self,
        contact: &Contact,
        call_script: Option<&str>,
        scheduled_call: Option<CallId>,
    ) -> Result<CallReport, DialdeskError> {
        let request = PlaceCallRequest {
            contact_id: contact.id,
            phone: contact.phone.clone(),
            script: template::script_for(call_script, contact),
            scheduled_call,
        };
        let placement = self.telephony.place_call(&request).await;
        match &placement {
            Ok(report) if !report.answered => warn!(
                contact_id = %contact.id,
                call_sid = %report.call_sid,
                reason = report.failure_reason.as_deref().unwrap_or("no answer"),
                "call not answered"
            ),
            Err(err) => warn!(contact_id = %contact.id, error = %err, "telephony placement failed"),
            Ok(_) => {}
        }
        placement
    }
}
