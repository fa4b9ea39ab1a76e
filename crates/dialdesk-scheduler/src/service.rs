// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled call service.
//!
//! Orchestrates validation, the lifecycle transitions and persistence. Every
//! write of an existing record is a compare-and-set on its revision, so a
//! user edit or cancel racing a dispatcher write never loses silently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use dialdesk_config::model::SchedulingConfig;
use dialdesk_core::{
    CallId, CallOutcome, CallStatus, ContactId, DialdeskError, FieldErrorCode, GroupId,
    RetryPolicy, ScheduledCall, StorageAdapter, TemplateId, TransitionError, ValidationErrors,
};

use crate::template;
use crate::validation::{
    CallCandidate, KnownTargets, ValidationContext, candidate_from_plan, non_blank, validate,
    validate_update,
};

/// Create, edit, cancel and report on scheduled calls.
pub struct CallScheduler {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    policy: RetryPolicy,
    default_retry_interval: u32,
}

impl CallScheduler {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>, config: &SchedulingConfig) -> Self {
        Self {
            storage,
            policy: RetryPolicy::from_limits(config.max_attempts, config.retry_horizon_hours),
            default_retry_interval: config.default_retry_interval,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn context(&self, now: DateTime<Utc>) -> ValidationContext {
        ValidationContext::new(now, self.default_retry_interval)
    }

    /// Schedule a new call. When `template_id` is given and the request has
    /// no script, the template's content is copied into the call.
    pub async fn create(
        &self,
        mut candidate: CallCandidate,
        template_id: Option<TemplateId>,
        now: DateTime<Utc>,
    ) -> Result<ScheduledCall, DialdeskError> {
        let template_errors = copy_template(&*self.storage, &mut candidate.script, template_id).await?;
        let targets = self.lookup_targets(&[&candidate]).await?;
        let plan = with_extra(
            validate(&candidate, &self.context(now), &targets),
            template_errors,
        )?;

        let call = self.storage.insert_call(&plan, now).await?;
        info!(
            call_id = %call.id(),
            call_type = %call.timing().call_type(),
            group = call.target().is_group(),
            "scheduled call created"
        );
        Ok(call)
    }

    pub async fn get(&self, id: CallId) -> Result<ScheduledCall, DialdeskError> {
        self.storage
            .get_call(id)
            .await?
            .ok_or(DialdeskError::NotFound {
                entity: "scheduled call",
                id: id.get(),
            })
    }

    /// All calls in creation order, optionally filtered by status.
    pub async fn list(&self, status: Option<CallStatus>) -> Result<Vec<ScheduledCall>, DialdeskError> {
        self.storage.list_calls(status).await
    }

    /// Pending and retrying calls ordered by when they are next due.
    pub async fn upcoming(&self, limit: usize) -> Result<Vec<ScheduledCall>, DialdeskError> {
        self.storage.list_upcoming_calls(limit).await
    }

    /// Apply a partial update and re-arm the call to `pending`.
    ///
    /// The merged record is validated in full. Completed and cancelled
    /// calls cannot be edited.
    pub async fn update(
        &self,
        id: CallId,
        mut patch: CallCandidate,
        template_id: Option<TemplateId>,
        now: DateTime<Utc>,
    ) -> Result<ScheduledCall, DialdeskError> {
        let current = self.get(id).await?;
        if !current.status().is_editable() {
            return Err(TransitionError::NotEditable {
                status: current.status(),
            }
            .into());
        }

        let template_errors = copy_template(&*self.storage, &mut patch.script, template_id).await?;
        let existing = candidate_from_plan(current.plan());
        let targets = self.lookup_targets(&[&patch, &existing]).await?;
        let plan = with_extra(
            validate_update(current.plan(), &patch, &self.context(now), &targets),
            template_errors,
        )?;

        let edited = current.apply_edit(plan, now)?;
        let saved = self.storage.save_call(&edited).await?;
        info!(
            call_id = %id,
            previous = %current.status(),
            revision = saved.revision(),
            "scheduled call updated"
        );
        Ok(saved)
    }

    /// Cancel a pending or retrying call. Attempt counters are untouched.
    pub async fn cancel(&self, id: CallId, now: DateTime<Utc>) -> Result<ScheduledCall, DialdeskError> {
        let current = self.get(id).await?;
        let cancelled = current.cancel(now)?;
        let saved = self.storage.save_call(&cancelled).await?;
        info!(
            call_id = %id,
            previous = %current.status(),
            attempts = saved.call_attempts(),
            "scheduled call cancelled"
        );
        Ok(saved)
    }

    pub async fn delete(&self, id: CallId) -> Result<(), DialdeskError> {
        if !self.storage.delete_call(id).await? {
            return Err(DialdeskError::NotFound {
                entity: "scheduled call",
                id: id.get(),
            });
        }
        info!(call_id = %id, "scheduled call deleted");
        Ok(())
    }

    /// Record a dispatch outcome reported by an external dispatcher.
    ///
    /// `expected_revision` is the revision the dispatcher read before it
    /// attempted the call. If the record moved on since, the report is
    /// stale and rejected with [`DialdeskError::Conflict`].
    pub async fn record_outcome(
        &self,
        id: CallId,
        expected_revision: i64,
        outcome: &CallOutcome,
        attempted_at: DateTime<Utc>,
    ) -> Result<ScheduledCall, DialdeskError> {
        let current = self.get(id).await?;
        if current.revision() != expected_revision {
            info!(
                call_id = %id,
                expected_revision,
                revision = current.revision(),
                "stale dispatch outcome rejected"
            );
            return Err(DialdeskError::Conflict {
                call_id: id,
                expected_revision,
            });
        }

        let next = current.apply_outcome(outcome, attempted_at, &self.policy)?;
        let saved = self.storage.save_call(&next).await?;
        info!(
            call_id = %id,
            status = %saved.status(),
            attempts = saved.call_attempts(),
            revision = saved.revision(),
            "dispatch outcome recorded"
        );
        Ok(saved)
    }

    /// Resolve which of the referenced contacts and groups exist.
    async fn lookup_targets(
        &self,
        candidates: &[&CallCandidate],
    ) -> Result<KnownTargets, DialdeskError> {
        let mut known = KnownTargets::new();
        for candidate in candidates {
            if let Some(raw) = candidate.contact_id
                && self.storage.get_contact(ContactId(raw)).await?.is_some()
            {
                known = known.with_contact(ContactId(raw));
            }
            if let Some(raw) = candidate.group_id
                && self.storage.get_group(GroupId(raw)).await?.is_some()
            {
                known = known.with_group(GroupId(raw));
            }
        }
        Ok(known)
    }
}

/// Copy a template into `script` when one is selected and no script was
/// given. A missing template is reported as a field error.
pub(crate) async fn copy_template(
    storage: &(dyn StorageAdapter + Send + Sync),
    script: &mut Option<String>,
    template_id: Option<TemplateId>,
) -> Result<ValidationErrors, DialdeskError> {
    let mut errors = ValidationErrors::new();
    let Some(id) = template_id else {
        return Ok(errors);
    };
    if non_blank(script.as_deref()).is_some() {
        return Ok(errors);
    }
    match storage.get_template(id).await? {
        Some(found) => *script = Some(template::snapshot(&found)),
        None => errors.push(
            "template_id",
            FieldErrorCode::NotFound,
            format!("prompt template {id} does not exist"),
        ),
    }
    Ok(errors)
}

/// Append `extra` violations to a validation result.
pub(crate) fn with_extra<T>(
    result: Result<T, ValidationErrors>,
    extra: ValidationErrors,
) -> Result<T, ValidationErrors> {
    match result {
        Ok(value) => extra.into_result(value),
        Err(mut errors) => {
            errors.extend(extra);
            Err(errors)
        }
    }
}
