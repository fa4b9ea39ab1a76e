// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled call persistence.
//!
//! Every write after the insert is a compare-and-set on `revision`: the
//! update only lands if the stored revision still matches the one the
//! caller read, and each landed write bumps it by one.

use chrono::{DateTime, Utc};
use dialdesk_core::{
    CallId, CallPlan, CallStatus, ContactId, DialdeskError, GroupId, ScheduledCall,
};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::database::{Database, format_opt_ts, format_ts, map_tr_err};
use crate::models::{CALL_COLUMNS, call_from_row};

/// Next due instant for pending and retrying calls, used for ordering.
const DUE_AT: &str = "CASE status WHEN 'retrying' THEN next_retry_at \
     ELSE COALESCE(scheduled_time, start_time_window) END";

/// Column values derived from a plan, in `scheduled_calls` column order.
struct PlanColumns {
    contact_id: Option<i64>,
    group_id: Option<i64>,
    call_type: &'static str,
    scheduled_time: Option<String>,
    start_time_window: Option<String>,
    end_time_window: Option<String>,
    retry_until_success: bool,
    retry_interval: i64,
    script: Option<String>,
    notes: Option<String>,
}

impl PlanColumns {
    fn from_plan(plan: &CallPlan) -> Self {
        let window = plan.timing.window();
        Self {
            contact_id: plan.target.contact_id().map(ContactId::get),
            group_id: plan.target.group_id().map(GroupId::get),
            call_type: plan.timing.call_type().as_str(),
            scheduled_time: format_opt_ts(plan.timing.scheduled_time()),
            start_time_window: format_opt_ts(window.map(|(start, _)| start)),
            end_time_window: format_opt_ts(window.map(|(_, end)| end)),
            retry_until_success: plan.retry_until_success,
            retry_interval: i64::from(plan.retry_interval),
            script: plan.script.clone(),
            notes: plan.notes.clone(),
        }
    }
}

fn load_call(conn: &Connection, id: i64) -> rusqlite::Result<Option<ScheduledCall>> {
    conn.query_row(
        &format!("SELECT {CALL_COLUMNS} FROM scheduled_calls WHERE id = ?1"),
        params![id],
        call_from_row,
    )
    .optional()
}

/// Insert a new `pending` call at revision 1.
pub async fn insert_call(
    db: &Database,
    plan: &CallPlan,
    now: DateTime<Utc>,
) -> Result<ScheduledCall, DialdeskError> {
    let cols = PlanColumns::from_plan(plan);
    let ts = format_ts(&now);
    let call = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scheduled_calls (
                    contact_id, group_id, call_type, scheduled_time, start_time_window,
                    end_time_window, status, retry_until_success, retry_interval, call_attempts,
                    script, notes, revision, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?8, 0, ?9, ?10, 1, ?11, ?11)",
                params![
                    cols.contact_id,
                    cols.group_id,
                    cols.call_type,
                    cols.scheduled_time,
                    cols.start_time_window,
                    cols.end_time_window,
                    cols.retry_until_success,
                    cols.retry_interval,
                    cols.script,
                    cols.notes,
                    ts,
                ],
            )?;
            let id = conn.last_insert_rowid();
            load_call(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(map_tr_err)?;

    debug!(call_id = %call.id(), call_type = %call.timing().call_type(), "scheduled call inserted");
    Ok(call)
}

pub async fn get_call(db: &Database, id: CallId) -> Result<Option<ScheduledCall>, DialdeskError> {
    db.connection()
        .call(move |conn| load_call(conn, id.get()))
        .await
        .map_err(map_tr_err)
}

/// All calls ordered by id, optionally filtered by status.
pub async fn list_calls(
    db: &Database,
    status: Option<CallStatus>,
) -> Result<Vec<ScheduledCall>, DialdeskError> {
    let status = status.map(|s| s.as_str());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CALL_COLUMNS} FROM scheduled_calls
                 WHERE ?1 IS NULL OR status = ?1
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![status], call_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Pending and retrying calls, soonest due first.
pub async fn list_upcoming_calls(
    db: &Database,
    limit: usize,
) -> Result<Vec<ScheduledCall>, DialdeskError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CALL_COLUMNS} FROM scheduled_calls
                 WHERE status IN ('pending', 'retrying')
                 ORDER BY {DUE_AT} ASC, id ASC
                 LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], call_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Calls whose next attempt is due at or before `now`, oldest due first.
///
/// A pending call is due from its scheduled time (or window start); a
/// retrying call from its `next_retry_at`.
pub async fn list_due_calls(
    db: &Database,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<ScheduledCall>, DialdeskError> {
    let now = format_ts(&now);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CALL_COLUMNS} FROM scheduled_calls
                 WHERE (status = 'pending' AND COALESCE(scheduled_time, start_time_window) <= ?1)
                    OR (status = 'retrying' AND next_retry_at <= ?1)
                 ORDER BY {DUE_AT} ASC, id ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![now, limit], call_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

enum CasOutcome {
    Saved(ScheduledCall),
    Stale,
    Missing,
}

/// Compare-and-set write of a transitioned call.
///
/// Lands only when the stored revision equals `call.revision()`. Returns the
/// stored record, whose revision is one higher.
pub async fn save_call(db: &Database, call: &ScheduledCall) -> Result<ScheduledCall, DialdeskError> {
    let id = call.id();
    let expected_revision = call.revision();
    let cols = PlanColumns::from_plan(call.plan());
    let status = call.status().as_str();
    let call_attempts = i64::from(call.call_attempts());
    let last_attempt_at = format_opt_ts(call.last_attempt_at());
    let next_retry_at = format_opt_ts(call.next_retry_at());
    let updated_at = format_ts(&call.updated_at());

    let outcome = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_calls SET
                    contact_id = ?1, group_id = ?2, call_type = ?3, scheduled_time = ?4,
                    start_time_window = ?5, end_time_window = ?6, retry_until_success = ?7,
                    retry_interval = ?8, script = ?9, notes = ?10, status = ?11,
                    call_attempts = ?12, last_attempt_at = ?13, next_retry_at = ?14,
                    updated_at = ?15, revision = revision + 1
                 WHERE id = ?16 AND revision = ?17",
                params![
                    cols.contact_id,
                    cols.group_id,
                    cols.call_type,
                    cols.scheduled_time,
                    cols.start_time_window,
                    cols.end_time_window,
                    cols.retry_until_success,
                    cols.retry_interval,
                    cols.script,
                    cols.notes,
                    status,
                    call_attempts,
                    last_attempt_at,
                    next_retry_at,
                    updated_at,
                    id.get(),
                    expected_revision,
                ],
            )?;
            if changed == 1 {
                return Ok(match load_call(conn, id.get())? {
                    Some(saved) => CasOutcome::Saved(saved),
                    None => CasOutcome::Missing,
                });
            }
            let exists = conn
                .query_row(
                    "SELECT 1 FROM scheduled_calls WHERE id = ?1",
                    params![id.get()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            Ok(if exists {
                CasOutcome::Stale
            } else {
                CasOutcome::Missing
            })
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        CasOutcome::Saved(saved) => {
            debug!(
                call_id = %saved.id(),
                status = %saved.status(),
                attempts = saved.call_attempts(),
                revision = saved.revision(),
                "scheduled call saved"
            );
            Ok(saved)
        }
        CasOutcome::Stale => Err(DialdeskError::Conflict {
            call_id: id,
            expected_revision,
        }),
        CasOutcome::Missing => Err(DialdeskError::NotFound {
            entity: "scheduled call",
            id: id.get(),
        }),
    }
}

pub async fn delete_call(db: &Database, id: CallId) -> Result<bool, DialdeskError> {
    let deleted = db
        .connection()
        .call(move |conn| {
            conn.execute("DELETE FROM scheduled_calls WHERE id = ?1", params![id.get()])
        })
        .await
        .map_err(map_tr_err)?;
    Ok(deleted > 0)
}

/// Pending or retrying calls targeting the contact directly.
pub async fn count_active_for_contact(db: &Database, id: ContactId) -> Result<u64, DialdeskError> {
    count_active(db, "contact_id", id.get()).await
}

/// Pending or retrying calls targeting the group.
pub async fn count_active_for_group(db: &Database, id: GroupId) -> Result<u64, DialdeskError> {
    count_active(db, "group_id", id.get()).await
}

async fn count_active(db: &Database, column: &'static str, id: i64) -> Result<u64, DialdeskError> {
    let count: i64 = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM scheduled_calls
                     WHERE {column} = ?1 AND status IN ('pending', 'retrying')"
                ),
                params![id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(u64::try_from(count).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::contacts::create_contact;
    use crate::queries::groups::create_group;
    use chrono::TimeZone;
    use dialdesk_core::{
        CallOutcome, CallTarget, CallTiming, ContactDraft, GroupDraft, RetryPolicy,
        latest_storable_instant,
    };
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("calls.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, h, m, s).unwrap()
    }

    async fn contact(db: &Database) -> ContactId {
        let draft = ContactDraft {
            name: "Ada".to_string(),
            phone: "5550100".to_string(),
            email: None,
            company: None,
            script: None,
            tags: vec![],
        };
        create_contact(db, &draft, at(0, 0, 0)).await.unwrap().id
    }

    fn exact_plan(contact_id: ContactId, h: u32, retry: bool) -> CallPlan {
        CallPlan {
            target: CallTarget::Contact(contact_id),
            timing: CallTiming::Exact {
                scheduled_time: at(h, 0, 0),
            },
            retry_until_success: retry,
            retry_interval: 60,
            script: Some("Hi {{name}}".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let (db, _dir) = setup_db().await;
        let contact_id = contact(&db).await;
        let plan = exact_plan(contact_id, 10, false);
        let call = insert_call(&db, &plan, at(8, 0, 0)).await.unwrap();

        assert_eq!(call.status(), CallStatus::Pending);
        assert_eq!(call.call_attempts(), 0);
        assert_eq!(call.revision(), 1);
        assert_eq!(call.plan(), &plan);

        let fetched = get_call(&db, call.id()).await.unwrap().unwrap();
        assert_eq!(fetched, call);
    }

    #[tokio::test]
    async fn window_group_call_round_trip() {
        let (db, _dir) = setup_db().await;
        let group = create_group(
            &db,
            &GroupDraft {
                name: "Leads".to_string(),
                description: None,
            },
            at(0, 0, 0),
        )
        .await
        .unwrap();
        let plan = CallPlan {
            target: CallTarget::Group(group.id),
            timing: CallTiming::Window {
                start: at(9, 0, 0),
                end: at(12, 0, 0),
            },
            retry_until_success: true,
            retry_interval: 30,
            script: None,
            notes: Some("quarterly".to_string()),
        };
        let call = insert_call(&db, &plan, at(8, 0, 0)).await.unwrap();
        let fetched = get_call(&db, call.id()).await.unwrap().unwrap();
        assert_eq!(fetched.plan(), &plan);
        assert_eq!(count_active_for_group(&db, group.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn save_bumps_revision() {
        let (db, _dir) = setup_db().await;
        let contact_id = contact(&db).await;
        let call = insert_call(&db, &exact_plan(contact_id, 10, true), at(8, 0, 0))
            .await
            .unwrap();

        let failed = call
            .apply_outcome(&CallOutcome::failure("busy"), at(10, 0, 5), &RetryPolicy::unbounded())
            .unwrap();
        let saved = save_call(&db, &failed).await.unwrap();
        assert_eq!(saved.revision(), 2);
        assert_eq!(saved.status(), CallStatus::Retrying);
        assert_eq!(saved.next_retry_at(), Some(at(11, 0, 5)));
        assert_eq!(saved.call_attempts(), 1);
    }

    #[tokio::test]
    async fn stale_write_is_rejected_after_cancel() {
        let (db, _dir) = setup_db().await;
        let contact_id = contact(&db).await;
        let call = insert_call(&db, &exact_plan(contact_id, 10, true), at(8, 0, 0))
            .await
            .unwrap();
        let retrying = save_call(
            &db,
            &call
                .apply_outcome(&CallOutcome::failure("busy"), at(10, 0, 0), &RetryPolicy::unbounded())
                .unwrap(),
        )
        .await
        .unwrap();

        // Dispatcher reads the record, user cancels meanwhile.
        let dispatcher_copy = retrying.clone();
        save_call(&db, &retrying.cancel(at(10, 30, 0)).unwrap())
            .await
            .unwrap();

        let late = dispatcher_copy
            .apply_outcome(&CallOutcome::Success, at(11, 0, 0), &RetryPolicy::unbounded())
            .unwrap();
        let err = save_call(&db, &late).await.unwrap_err();
        assert!(matches!(
            err,
            DialdeskError::Conflict {
                expected_revision: 2,
                ..
            }
        ));

        let stored = get_call(&db, call.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), CallStatus::Cancelled);
        assert_eq!(stored.call_attempts(), 1);
    }

    #[tokio::test]
    async fn save_of_deleted_call_is_not_found() {
        let (db, _dir) = setup_db().await;
        let contact_id = contact(&db).await;
        let call = insert_call(&db, &exact_plan(contact_id, 10, false), at(8, 0, 0))
            .await
            .unwrap();
        assert!(delete_call(&db, call.id()).await.unwrap());
        let err = save_call(&db, &call.cancel(at(9, 0, 0)).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DialdeskError::NotFound { .. }));
    }

    #[tokio::test]
    async fn due_calls_cover_pending_and_retrying() {
        let (db, _dir) = setup_db().await;
        let contact_id = contact(&db).await;
        let early = insert_call(&db, &exact_plan(contact_id, 9, true), at(8, 0, 0))
            .await
            .unwrap();
        let later = insert_call(&db, &exact_plan(contact_id, 11, false), at(8, 0, 0))
            .await
            .unwrap();

        let due = list_due_calls(&db, at(10, 0, 0), 10).await.unwrap();
        assert_eq!(due.iter().map(|c| c.id()).collect::<Vec<_>>(), vec![early.id()]);

        // Fails at 09:00, retries at 10:00.
        save_call(
            &db,
            &early
                .apply_outcome(&CallOutcome::failure("busy"), at(9, 0, 0), &RetryPolicy::unbounded())
                .unwrap(),
        )
        .await
        .unwrap();
        assert!(list_due_calls(&db, at(9, 59, 59), 10).await.unwrap().is_empty());

        let due = list_due_calls(&db, at(11, 0, 0), 10).await.unwrap();
        assert_eq!(
            due.iter().map(|c| c.id()).collect::<Vec<_>>(),
            vec![early.id(), later.id()]
        );
        assert_eq!(list_due_calls(&db, at(11, 0, 0), 1).await.unwrap().len(), 1);

        let upcoming = list_upcoming_calls(&db, 10).await.unwrap();
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].id(), early.id());
    }

    #[tokio::test]
    async fn far_future_retry_stays_readable() {
        let (db, _dir) = setup_db().await;
        let contact_id = contact(&db).await;
        let mut plan = exact_plan(contact_id, 10, true);
        plan.retry_interval = u32::MAX;
        let call = insert_call(&db, &plan, at(8, 0, 0)).await.unwrap();

        let failed = call
            .apply_outcome(&CallOutcome::failure("busy"), at(10, 0, 5), &RetryPolicy::unbounded())
            .unwrap();
        assert_eq!(failed.next_retry_at(), Some(latest_storable_instant()));

        let saved = save_call(&db, &failed).await.unwrap();
        assert_eq!(saved.next_retry_at(), Some(latest_storable_instant()));
        assert!(list_due_calls(&db, at(10, 1, 0), 10).await.unwrap().is_empty());
        assert_eq!(list_calls(&db, None).await.unwrap(), vec![saved]);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_counts_active() {
        let (db, _dir) = setup_db().await;
        let contact_id = contact(&db).await;
        let a = insert_call(&db, &exact_plan(contact_id, 9, false), at(8, 0, 0))
            .await
            .unwrap();
        insert_call(&db, &exact_plan(contact_id, 10, false), at(8, 0, 0))
            .await
            .unwrap();
        save_call(&db, &a.cancel(at(8, 30, 0)).unwrap()).await.unwrap();

        assert_eq!(list_calls(&db, None).await.unwrap().len(), 2);
        let cancelled = list_calls(&db, Some(CallStatus::Cancelled)).await.unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id(), a.id());
        assert_eq!(count_active_for_contact(&db, contact_id).await.unwrap(), 1);
    }
}
