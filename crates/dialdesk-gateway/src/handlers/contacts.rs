// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/api/contacts` handlers, including dialogs and tags.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use dialdesk_core::{Contact, ContactId, Dialog};
use dialdesk_scheduler::{ContactInput, DialogInput};

use crate::error::ApiError;
use crate::handlers::{Deleted, TemplateQuery};
use crate::server::ApiState;

#[derive(Debug, Default, Deserialize)]
pub struct ContactListQuery {
    #[serde(default)]
    pub tag: Option<String>,
}

/// Body of `POST /contacts/{id}/tags`.
#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

pub async fn list(
    State(state): State<ApiState>,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.directory.list_contacts(query.tag.as_deref()).await?))
}

pub async fn create(
    State(state): State<ApiState>,
    Query(query): Query<TemplateQuery>,
    Json(body): Json<ContactInput>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let contact = state
        .directory
        .create_contact(body, query.template(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn get(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Contact>, ApiError> {
    Ok(Json(state.directory.get_contact(ContactId(id)).await?))
}

/// PUT and PATCH: fields left out keep their stored values.
pub async fn update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Query(query): Query<TemplateQuery>,
    Json(body): Json<ContactInput>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state
        .directory
        .update_contact(ContactId(id), body, query.template(), Utc::now())
        .await?;
    Ok(Json(contact))
}

pub async fn remove(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, ApiError> {
    state.directory.delete_contact(ContactId(id)).await?;
    Ok(Json(Deleted::new("contact", id)))
}

pub async fn list_dialogs(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Dialog>>, ApiError> {
    Ok(Json(state.directory.dialogs(ContactId(id)).await?))
}

pub async fn add_dialog(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<DialogInput>,
) -> Result<(StatusCode, Json<Dialog>), ApiError> {
    let dialog = state
        .directory
        .add_dialog(ContactId(id), &body, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(dialog)))
}

pub async fn add_tags(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<TagsRequest>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state
        .directory
        .add_tags(ContactId(id), &body.tags, Utc::now())
        .await?;
    Ok(Json(contact))
}

pub async fn remove_tag(
    State(state): State<ApiState>,
    Path((id, tag)): Path<(i64, String)>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state
        .directory
        .remove_tag(ContactId(id), &tag, Utc::now())
        .await?;
    Ok(Json(contact))
}
