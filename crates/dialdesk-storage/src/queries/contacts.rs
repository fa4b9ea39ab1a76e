// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact CRUD operations.

use chrono::{DateTime, Utc};
use dialdesk_core::{Contact, ContactDraft, ContactId, DialdeskError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err, to_json};
use crate::models::{CONTACT_COLUMNS, contact_from_row};

/// Insert a contact and return it with its assigned id.
pub async fn create_contact(
    db: &Database,
    draft: &ContactDraft,
    now: DateTime<Utc>,
) -> Result<Contact, DialdeskError> {
    let draft = draft.clone();
    let ts = format_ts(&now);
    let id = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (name, phone, email, company, script, tags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    draft.name,
                    draft.phone,
                    draft.email,
                    draft.company,
                    draft.script,
                    to_json(&draft.tags)?,
                    ts,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)?;

    let created = get_contact(db, ContactId(id)).await?;
    created.ok_or_else(|| DialdeskError::Internal(format!("contact {id} vanished after insert")))
}

/// Get a contact by id.
pub async fn get_contact(db: &Database, id: ContactId) -> Result<Option<Contact>, DialdeskError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
                params![id.get()],
                contact_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All contacts ordered by id.
pub async fn list_contacts(db: &Database) -> Result<Vec<Contact>, DialdeskError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map([], contact_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite a contact's fields. `None` when the contact does not exist.
pub async fn update_contact(
    db: &Database,
    id: ContactId,
    draft: &ContactDraft,
    now: DateTime<Utc>,
) -> Result<Option<Contact>, DialdeskError> {
    let draft = draft.clone();
    let ts = format_ts(&now);
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE contacts
                 SET name = ?1, phone = ?2, email = ?3, company = ?4, script = ?5, tags = ?6,
                     updated_at = ?7
                 WHERE id = ?8",
                params![
                    draft.name,
                    draft.phone,
                    draft.email,
                    draft.company,
                    draft.script,
                    to_json(&draft.tags)?,
                    ts,
                    id.get(),
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Ok(None);
    }
    get_contact(db, id).await
}

/// Delete a contact. Dialogs and group memberships cascade.
pub async fn delete_contact(db: &Database, id: ContactId) -> Result<bool, DialdeskError> {
    let deleted = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM contacts WHERE id = ?1", params![id.get()]))
        .await
        .map_err(map_tr_err)?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn draft(name: &str) -> ContactDraft {
        ContactDraft {
            name: name.to_string(),
            phone: "+1 (555) 010-2030".to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            company: Some("Acme".to_string()),
            script: None,
            tags: vec!["lead".to_string(), "vip".to_string()],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2029, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let (db, _dir) = setup_db().await;
        let created = create_contact(&db, &draft("Ada"), now()).await.unwrap();
        assert!(created.id.get() > 0);
        assert_eq!(created.tags, vec!["lead", "vip"]);
        assert_eq!(created.created_at, now());

        let fetched = get_contact(&db, created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_missing_contact_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_contact(&db, ContactId(404)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_overwrites_fields() {
        let (db, _dir) = setup_db().await;
        let created = create_contact(&db, &draft("Ada"), now()).await.unwrap();
        let mut changes = draft("Ada Lovelace");
        changes.tags = vec!["customer".to_string()];
        changes.email = None;
        let later = now() + chrono::Duration::minutes(5);

        let updated = update_contact(&db, created.id, &changes, later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.tags, vec!["customer"]);
        assert!(updated.email.is_none());
        assert_eq!(updated.created_at, now());
        assert_eq!(updated.updated_at, later);

        let missing = update_contact(&db, ContactId(999), &changes, later).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_and_delete() {
        let (db, _dir) = setup_db().await;
        let a = create_contact(&db, &draft("Ada"), now()).await.unwrap();
        let b = create_contact(&db, &draft("Grace"), now()).await.unwrap();

        let all = list_contacts(&db).await.unwrap();
        assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a.id, b.id]);

        assert!(delete_contact(&db, a.id).await.unwrap());
        assert!(!delete_contact(&db, a.id).await.unwrap());
        assert_eq!(list_contacts(&db).await.unwrap().len(), 1);
    }
}
