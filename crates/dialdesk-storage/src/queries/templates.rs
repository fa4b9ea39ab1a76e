// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt template CRUD operations.

use chrono::{DateTime, Utc};
use dialdesk_core::{DialdeskError, PromptTemplate, TemplateDraft, TemplateId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err};
use crate::models::{TEMPLATE_COLUMNS, template_from_row};

pub async fn create_template(
    db: &Database,
    draft: &TemplateDraft,
    now: DateTime<Utc>,
) -> Result<PromptTemplate, DialdeskError> {
    let draft = draft.clone();
    let ts = format_ts(&now);
    let id = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO prompt_templates (name, content, created_at) VALUES (?1, ?2, ?3)",
                params![draft.name, draft.content, ts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)?;

    get_template(db, TemplateId(id))
        .await?
        .ok_or_else(|| DialdeskError::Internal(format!("template {id} vanished after insert")))
}

pub async fn get_template(
    db: &Database,
    id: TemplateId,
) -> Result<Option<PromptTemplate>, DialdeskError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM prompt_templates WHERE id = ?1"),
                params![id.get()],
                template_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Templates, newest first.
pub async fn list_templates(db: &Database) -> Result<Vec<PromptTemplate>, DialdeskError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TEMPLATE_COLUMNS} FROM prompt_templates ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], template_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Rename or rewrite a template. `created_at` is kept.
pub async fn update_template(
    db: &Database,
    id: TemplateId,
    draft: &TemplateDraft,
) -> Result<Option<PromptTemplate>, DialdeskError> {
    let draft = draft.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE prompt_templates SET name = ?1, content = ?2 WHERE id = ?3",
                params![draft.name, draft.content, id.get()],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Ok(None);
    }
    get_template(db, id).await
}

pub async fn delete_template(db: &Database, id: TemplateId) -> Result<bool, DialdeskError> {
    let deleted = db
        .connection()
        .call(move |conn| {
            conn.execute("DELETE FROM prompt_templates WHERE id = ?1", params![id.get()])
        })
        .await
        .map_err(map_tr_err)?;
    Ok(deleted > 0)
}
