// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/api/groups` handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use dialdesk_core::{Contact, ContactId, Group, GroupId};
use dialdesk_scheduler::GroupInput;

use crate::error::ApiError;
use crate::handlers::Deleted;
use crate::server::ApiState;

/// Body of `POST /groups/{id}/members`.
#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub contact_id: i64,
}

pub async fn list(State(state): State<ApiState>) -> Result<Json<Vec<Group>>, ApiError> {
    Ok(Json(state.directory.list_groups().await?))
}

pub async fn create(
    State(state): State<ApiState>,
    Json(body): Json<GroupInput>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = state.directory.create_group(&body, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.directory.get_group(GroupId(id)).await?))
}

pub async fn update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<GroupInput>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.directory.update_group(GroupId(id), body).await?))
}

/// Deletes the group only; member contacts stay.
pub async fn remove(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, ApiError> {
    state.directory.delete_group(GroupId(id)).await?;
    Ok(Json(Deleted::new("group", id)))
}

pub async fn add_member(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<MemberRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = state
        .directory
        .add_member(GroupId(id), ContactId(body.contact_id))
        .await?;
    Ok(Json(group))
}

pub async fn remove_member(
    State(state): State<ApiState>,
    Path((id, contact_id)): Path<(i64, i64)>,
) -> Result<Json<Group>, ApiError> {
    let group = state
        .directory
        .remove_member(GroupId(id), ContactId(contact_id))
        .await?;
    Ok(Json(group))
}

pub async fn contacts(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.directory.group_contacts(GroupId(id)).await?))
}
