// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/api/prompt-templates` handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use dialdesk_core::{PromptTemplate, TemplateId};
use dialdesk_scheduler::TemplateInput;

use crate::error::ApiError;
use crate::handlers::Deleted;
use crate::server::ApiState;

pub async fn list(State(state): State<ApiState>) -> Result<Json<Vec<PromptTemplate>>, ApiError> {
    Ok(Json(state.directory.list_templates().await?))
}

pub async fn create(
    State(state): State<ApiState>,
    Json(body): Json<TemplateInput>,
) -> Result<(StatusCode, Json<PromptTemplate>), ApiError> {
    let template = state.directory.create_template(&body, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn get(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<PromptTemplate>, ApiError> {
    Ok(Json(state.directory.get_template(TemplateId(id)).await?))
}

pub async fn update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(body): Json<TemplateInput>,
) -> Result<Json<PromptTemplate>, ApiError> {
    Ok(Json(state.directory.update_template(TemplateId(id), body).await?))
}

pub async fn remove(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, ApiError> {
    state.directory.delete_template(TemplateId(id)).await?;
    Ok(Json(Deleted::new("prompt template", id)))
}
