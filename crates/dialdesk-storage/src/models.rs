// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite rows and the domain types in `dialdesk-core`.
//!
//! Each `*_COLUMNS` constant lists the columns its `*_from_row` function
//! expects, in order.

use dialdesk_core::call::CallRecord;
use dialdesk_core::{
    CallId, CallPlan, CallStatus, CallTarget, CallTiming, CallType, Contact, ContactId, Dialog,
    DialogId, GroupId, PromptTemplate, ScheduledCall, TemplateId,
};
use rusqlite::Row;
use rusqlite::types::Type;

use crate::database::{enum_column, json_column, opt_ts_column, ts_column};

pub const CONTACT_COLUMNS: &str =
    "id, name, phone, email, company, script, tags, created_at, updated_at";

pub fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: ContactId(row.get(0)?),
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        company: row.get(4)?,
        script: row.get(5)?,
        tags: json_column(row, 6)?,
        created_at: ts_column(row, 7)?,
        updated_at: ts_column(row, 8)?,
    })
}

pub const DIALOG_COLUMNS: &str = "id, contact_id, date, messages, transcript";

pub fn dialog_from_row(row: &Row<'_>) -> rusqlite::Result<Dialog> {
    Ok(Dialog {
        id: DialogId(row.get(0)?),
        contact_id: ContactId(row.get(1)?),
        date: ts_column(row, 2)?,
        messages: json_column(row, 3)?,
        transcript: row.get(4)?,
    })
}

pub const TEMPLATE_COLUMNS: &str = "id, name, content, created_at";

pub fn template_from_row(row: &Row<'_>) -> rusqlite::Result<PromptTemplate> {
    Ok(PromptTemplate {
        id: TemplateId(row.get(0)?),
        name: row.get(1)?,
        content: row.get(2)?,
        created_at: ts_column(row, 3)?,
    })
}

pub const CALL_COLUMNS: &str = "id, contact_id, group_id, call_type, scheduled_time, \
     start_time_window, end_time_window, status, retry_until_success, retry_interval, \
     call_attempts, last_attempt_at, next_retry_at, script, notes, revision, created_at, updated_at";

#[derive(Debug)]
struct InvalidCallRow(&'static str);

impl std::fmt::Display for InvalidCallRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for InvalidCallRow {}

fn invalid(idx: usize, message: &'static str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Null, Box::new(InvalidCallRow(message)))
}

pub fn call_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduledCall> {
    let contact_id: Option<i64> = row.get(1)?;
    let group_id: Option<i64> = row.get(2)?;
    let target = match (contact_id, group_id) {
        (Some(id), None) => CallTarget::Contact(ContactId(id)),
        (None, Some(id)) => CallTarget::Group(GroupId(id)),
        _ => return Err(invalid(1, "exactly one of contact_id and group_id must be set")),
    };

    let call_type: CallType = enum_column(row, 3)?;
    let timing = match call_type {
        CallType::Exact => CallTiming::Exact {
            scheduled_time: ts_column(row, 4)?,
        },
        CallType::Window => CallTiming::Window {
            start: ts_column(row, 5)?,
            end: ts_column(row, 6)?,
        },
    };

    let retry_interval: i64 = row.get(9)?;
    let retry_interval =
        u32::try_from(retry_interval).map_err(|_| invalid(9, "retry_interval out of range"))?;
    let call_attempts: i64 = row.get(10)?;
    let call_attempts =
        u32::try_from(call_attempts).map_err(|_| invalid(10, "call_attempts out of range"))?;

    let status: CallStatus = enum_column(row, 7)?;

    Ok(ScheduledCall::restore(CallRecord {
        id: CallId(row.get(0)?),
        plan: CallPlan {
            target,
            timing,
            retry_until_success: row.get(8)?,
            retry_interval,
            script: row.get(13)?,
            notes: row.get(14)?,
        },
        status,
        call_attempts,
        last_attempt_at: opt_ts_column(row, 11)?,
        next_retry_at: opt_ts_column(row, 12)?,
        revision: row.get(15)?,
        created_at: ts_column(row, 16)?,
        updated_at: ts_column(row, 17)?,
    }))
}
