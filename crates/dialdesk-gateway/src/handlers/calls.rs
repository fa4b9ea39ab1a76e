// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/api/scheduled-calls` and `/api/calls/immediate` handlers.
//!
//! Calls are returned flat, the way clients submit them, with the
//! lifecycle fields added.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dialdesk_core::{
    CallId, CallOutcome, CallStatus, CallType, ContactId, Dialog, ScheduledCall, TemplateId,
};
use dialdesk_scheduler::CallCandidate;

use crate::error::ApiError;
use crate::handlers::{Deleted, TemplateQuery};
use crate::server::ApiState;

const DEFAULT_UPCOMING_LIMIT: usize = 20;

/// A scheduled call as returned by every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallResponse {
    pub id: i64,
    pub contact_id: Option<i64>,
    pub group_id: Option<i64>,
    pub call_type: CallType,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub start_time_window: Option<DateTime<Utc>>,
    pub end_time_window: Option<DateTime<Utc>>,
    pub retry_until_success: bool,
    pub retry_interval: u32,
    pub script: Option<String>,
    pub notes: Option<String>,
    pub status: CallStatus,
    pub call_attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ScheduledCall> for CallResponse {
    fn from(call: &ScheduledCall) -> Self {
        let plan = call.plan();
        let window = plan.timing.window();
        Self {
            id: call.id().get(),
            contact_id: plan.target.contact_id().map(ContactId::get),
            group_id: plan.target.group_id().map(|g| g.get()),
            call_type: plan.timing.call_type(),
            scheduled_time: plan.timing.scheduled_time(),
            start_time_window: window.map(|(start, _)| start),
            end_time_window: window.map(|(_, end)| end),
            retry_until_success: plan.retry_until_success,
            retry_interval: plan.retry_interval,
            script: plan.script.clone(),
            notes: plan.notes.clone(),
            status: call.status(),
            call_attempts: call.call_attempts(),
            last_attempt_at: call.last_attempt_at(),
            next_retry_at: call.next_retry_at(),
            revision: call.revision(),
            created_at: call.created_at(),
            updated_at: call.updated_at(),
        }
    }
}

fn respond(call: &ScheduledCall) -> Json<CallResponse> {
    Json(CallResponse::from(call))
}

#[derive(Debug, Default, Deserialize)]
pub struct CallListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Wire form of a dispatch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// Body of `POST /scheduled-calls/{id}/outcome`.
#[derive(Debug, Deserialize)]
pub struct OutcomeRequest {
    /// Revision the dispatcher read before attempting the call.
    pub revision: i64,
    pub outcome: OutcomeKind,
    /// Defaults to the time the report is received.
    #[serde(default)]
    pub attempted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl OutcomeRequest {
    fn outcome(&self) -> CallOutcome {
        match self.outcome {
            OutcomeKind::Success => CallOutcome::Success,
            OutcomeKind::Failure => CallOutcome::Failure {
                reason: self.reason.clone(),
            },
        }
    }
}

/// Body of `POST /calls/immediate`.
#[derive(Debug, Deserialize)]
pub struct ImmediateRequest {
    pub contact_id: i64,
    #[serde(default)]
    pub script: Option<String>,
    /// Used when `script` is absent.
    #[serde(default)]
    pub template_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ImmediateResponse {
    pub call_sid: String,
    pub answered: bool,
    pub dialog: Dialog,
}

pub async fn list(
    State(state): State<ApiState>,
    Query(query): Query<CallListQuery>,
) -> Result<Json<Vec<CallResponse>>, ApiError> {
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(CallStatus::from_str(&raw.to_ascii_lowercase()).map_err(|_| {
            ApiError::invalid_param("status", format!("unknown status '{raw}'"))
        })?),
        None => None,
    };
    let calls = state.scheduler.list(status).await?;
    Ok(Json(calls.iter().map(CallResponse::from).collect()))
}

pub async fn upcoming(
    State(state): State<ApiState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<CallResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
    let calls = state.scheduler.upcoming(limit).await?;
    Ok(Json(calls.iter().map(CallResponse::from).collect()))
}

pub async fn create(
    State(state): State<ApiState>,
    Query(query): Query<TemplateQuery>,
    Json(body): Json<CallCandidate>,
) -> Result<(StatusCode, Json<CallResponse>), ApiError> {
    let call = state
        .scheduler
        .create(body, query.template(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, respond(&call)))
}

pub async fn get(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<CallResponse>, ApiError> {
    Ok(respond(&state.scheduler.get(CallId(id)).await?))
}

/// PUT and PATCH: partial update, validated over the merged record.
pub async fn update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Query(query): Query<TemplateQuery>,
    Json(body): Json<CallCandidate>,
) -> Result<Json<CallResponse>, ApiError> {
    let call = state
        .scheduler
        .update(CallId(id), body, query.template(), Utc::now())
        .await?;
    Ok(respond(&call))
}

pub async fn cancel(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<CallResponse>, ApiError> {
    Ok(respond(&state.scheduler.cancel(CallId(id), Utc::now()).await?))
}

pub async fn remove(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, ApiError> {
    state.scheduler.delete(CallId(id)).await?;
    Ok(Json(Deleted::new("scheduled call", id)))
}

pub async fn record_outcome(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<OutcomeRequest>,
) -> Result<Json<CallResponse>, ApiError> {
    let attempted_at = body.attempted_at.unwrap_or_else(Utc::now);
    let call = state
        .scheduler
        .record_outcome(CallId(id), body.revision, &body.outcome(), attempted_at)
        .await?;
    Ok(respond(&call))
}

pub async fn immediate(
    State(state): State<ApiState>,
    Json(body): Json<ImmediateRequest>,
) -> Result<Json<ImmediateResponse>, ApiError> {
    let script = match (body.script, body.template_id) {
        (Some(script), _) if !script.trim().is_empty() => Some(script),
        (_, Some(template_id)) => Some(
            state
                .directory
                .get_template(TemplateId(template_id))
                .await?
                .content,
        ),
        _ => None,
    };
    let result = state
        .runner
        .place_immediate(ContactId(body.contact_id), script, Utc::now())
        .await?;
    Ok(Json(ImmediateResponse {
        call_sid: result.call_sid,
        answered: result.answered,
        dialog: result.dialog,
    }))
}
