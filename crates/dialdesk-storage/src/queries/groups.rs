// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group CRUD and membership operations.

use chrono::{DateTime, Utc};
use dialdesk_core::{Contact, ContactId, DialdeskError, Group, GroupDraft, GroupId};
use rusqlite::{Connection, OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err, ts_column};
use crate::models::{CONTACT_COLUMNS, contact_from_row};

fn load_members(conn: &Connection, group_id: i64) -> rusqlite::Result<Vec<ContactId>> {
    let mut stmt = conn.prepare(
        "SELECT contact_id FROM group_members WHERE group_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![group_id], |row| Ok(ContactId(row.get(0)?)))?;
    rows.collect()
}

fn load_group(conn: &Connection, id: i64) -> rusqlite::Result<Option<Group>> {
    let group = conn
        .query_row(
            "SELECT id, name, description, created_at FROM contact_groups WHERE id = ?1",
            params![id],
            |row| {
                Ok(Group {
                    id: GroupId(row.get(0)?),
                    name: row.get(1)?,
                    description: row.get(2)?,
                    members: Vec::new(),
                    created_at: ts_column(row, 3)?,
                })
            },
        )
        .optional()?;
    match group {
        Some(mut group) => {
            group.members = load_members(conn, id)?;
            Ok(Some(group))
        }
        None => Ok(None),
    }
}

pub async fn create_group(
    db: &Database,
    draft: &GroupDraft,
    now: DateTime<Utc>,
) -> Result<Group, DialdeskError> {
    let draft = draft.clone();
    let ts = format_ts(&now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contact_groups (name, description, created_at) VALUES (?1, ?2, ?3)",
                params![draft.name, draft.description, ts],
            )?;
            let id = conn.last_insert_rowid();
            load_group(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(map_tr_err)
}

/// A group with its current members.
pub async fn get_group(db: &Database, id: GroupId) -> Result<Option<Group>, DialdeskError> {
    db.connection()
        .call(move |conn| load_group(conn, id.get()))
        .await
        .map_err(map_tr_err)
}

/// All groups ordered by id, each with its members.
pub async fn list_groups(db: &Database) -> Result<Vec<Group>, DialdeskError> {
    db.connection()
        .call(|conn| {
            let ids: Vec<i64> = {
                let mut stmt = conn.prepare("SELECT id FROM contact_groups ORDER BY id ASC")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            let mut groups = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(group) = load_group(conn, id)? {
                    groups.push(group);
                }
            }
            Ok(groups)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_group(
    db: &Database,
    id: GroupId,
    draft: &GroupDraft,
) -> Result<Option<Group>, DialdeskError> {
    let draft = draft.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE contact_groups SET name = ?1, description = ?2 WHERE id = ?3",
                params![draft.name, draft.description, id.get()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_group(conn, id.get())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a group. Memberships cascade; contacts are kept.
pub async fn delete_group(db: &Database, id: GroupId) -> Result<bool, DialdeskError> {
    let deleted = db
        .connection()
        .call(move |conn| {
            conn.execute("DELETE FROM contact_groups WHERE id = ?1", params![id.get()])
        })
        .await
        .map_err(map_tr_err)?;
    Ok(deleted > 0)
}

/// Add a member. Returns `false` if the contact already belonged to the group.
pub async fn add_member(
    db: &Database,
    group_id: GroupId,
    contact_id: ContactId,
) -> Result<bool, DialdeskError> {
    let inserted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO group_members (group_id, contact_id) VALUES (?1, ?2)",
                params![group_id.get(), contact_id.get()],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(inserted > 0)
}

pub async fn remove_member(
    db: &Database,
    group_id: GroupId,
    contact_id: ContactId,
) -> Result<bool, DialdeskError> {
    let removed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM group_members WHERE group_id = ?1 AND contact_id = ?2",
                params![group_id.get(), contact_id.get()],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(removed > 0)
}

/// Member contacts in membership order, read at call time.
pub async fn list_group_contacts(
    db: &Database,
    group_id: GroupId,
) -> Result<Vec<Contact>, DialdeskError> {
    db.connection()
        .call(move |conn| {
            let columns = CONTACT_COLUMNS
                .split(", ")
                .map(|c| format!("c.{c}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {columns} FROM group_members m
                 JOIN contacts c ON c.id = m.contact_id
                 WHERE m.group_id = ?1
                 ORDER BY m.rowid ASC"
            ))?;
            let rows = stmt.query_map(params![group_id.get()], contact_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::contacts::{create_contact, delete_contact, get_contact};
    use dialdesk_core::ContactDraft;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    async fn contact(db: &Database, name: &str) -> ContactId {
        let draft = ContactDraft {
            name: name.to_string(),
            phone: "5550100".to_string(),
            email: None,
            company: None,
            script: None,
            tags: vec![],
        };
        create_contact(db, &draft, Utc::now()).await.unwrap().id
    }

    fn draft(name: &str) -> GroupDraft {
        GroupDraft {
            name: name.to_string(),
            description: Some("quarterly follow-ups".to_string()),
        }
    }

    #[tokio::test]
    async fn membership_preserves_order_and_ignores_duplicates() {
        let (db, _dir) = setup_db().await;
        let group = create_group(&db, &draft("Leads"), Utc::now()).await.unwrap();
        let grace = contact(&db, "Grace").await;
        let ada = contact(&db, "Ada").await;

        assert!(add_member(&db, group.id, grace).await.unwrap());
        assert!(add_member(&db, group.id, ada).await.unwrap());
        assert!(!add_member(&db, group.id, grace).await.unwrap());

        let loaded = get_group(&db, group.id).await.unwrap().unwrap();
        assert_eq!(loaded.members, vec![grace, ada]);

        let contacts = list_group_contacts(&db, group.id).await.unwrap();
        let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Grace", "Ada"]);
    }

    #[tokio::test]
    async fn deleting_group_keeps_contacts() {
        let (db, _dir) = setup_db().await;
        let group = create_group(&db, &draft("Leads"), Utc::now()).await.unwrap();
        let ada = contact(&db, "Ada").await;
        add_member(&db, group.id, ada).await.unwrap();

        assert!(delete_group(&db, group.id).await.unwrap());
        assert!(get_group(&db, group.id).await.unwrap().is_none());
        assert!(get_contact(&db, ada).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_contact_drops_membership() {
        let (db, _dir) = setup_db().await;
        let group = create_group(&db, &draft("Leads"), Utc::now()).await.unwrap();
        let ada = contact(&db, "Ada").await;
        let grace = contact(&db, "Grace").await;
        add_member(&db, group.id, ada).await.unwrap();
        add_member(&db, group.id, grace).await.unwrap();

        delete_contact(&db, ada).await.unwrap();
        let loaded = get_group(&db, group.id).await.unwrap().unwrap();
        assert_eq!(loaded.members, vec![grace]);
    }

    #[tokio::test]
    async fn update_and_remove_member() {
        let (db, _dir) = setup_db().await;
        let group = create_group(&db, &draft("Leads"), Utc::now()).await.unwrap();
        let ada = contact(&db, "Ada").await;
        add_member(&db, group.id, ada).await.unwrap();

        let renamed = update_group(
            &db,
            group.id,
            &GroupDraft {
                name: "Customers".to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(renamed.name, "Customers");
        assert!(renamed.description.is_none());
        assert_eq!(renamed.members, vec![ada]);

        assert!(remove_member(&db, group.id, ada).await.unwrap());
        assert!(!remove_member(&db, group.id, ada).await.unwrap());
        assert!(list_groups(&db).await.unwrap()[0].members.is_empty());
    }
}
