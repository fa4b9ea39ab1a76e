// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only dialog history.

use dialdesk_core::{ContactId, DialdeskError, Dialog, DialogDraft, DialogId};
use rusqlite::params;

use crate::database::{Database, format_ts, map_tr_err, to_json};
use crate::models::{DIALOG_COLUMNS, dialog_from_row};

/// Append a dialog to a contact's history.
pub async fn append_dialog(
    db: &Database,
    contact_id: ContactId,
    draft: &DialogDraft,
) -> Result<Dialog, DialdeskError> {
    let stored = draft.clone();
    let date = format_ts(&draft.date);
    let messages = to_json(&draft.messages);
    let transcript = draft.transcript.clone();
    let id = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO dialogs (contact_id, date, messages, transcript)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    contact_id.get(),
                    date,
                    messages?,
                    transcript
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)?;

    Ok(Dialog {
        id: DialogId(id),
        contact_id,
        date: stored.date,
        messages: stored.messages,
        transcript: stored.transcript,
    })
}

/// Dialogs of one contact, newest first.
pub async fn list_dialogs(
    db: &Database,
    contact_id: ContactId,
) -> Result<Vec<Dialog>, DialdeskError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DIALOG_COLUMNS} FROM dialogs WHERE contact_id = ?1
                 ORDER BY date DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![contact_id.get()], dialog_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
