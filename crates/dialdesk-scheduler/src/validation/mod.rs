// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request validation.
//!
//! Validators take raw request fields and return either a normalized draft
//! or every violated field at once. They never touch storage: references are
//! checked against data the caller looked up beforehand.

pub mod call;
pub mod records;

use chrono::{DateTime, NaiveDateTime, Utc};
use dialdesk_core::is_storable;
use serde::{Deserialize, Serialize};

pub use call::{
    CallCandidate, KnownTargets, TargetDirectory, ValidationContext, candidate_from_plan, validate,
    validate_update,
};
pub use records::{
    ContactInput, DialogInput, GroupInput, TemplateInput, normalize_tags, validate_contact,
    validate_dialog, validate_group, validate_template,
};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a client timestamp into UTC.
///
/// Accepts RFC 3339 with an offset, or a naive ISO 8601 date-time (as sent
/// by `datetime-local` inputs) which is taken to be UTC. Years outside
/// 0000-9999 are rejected.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let parsed = match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(_) => NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc()),
    };
    parsed.filter(|ts| is_storable(*ts))
}

/// An integer field that some clients send as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for NumberOrText {
    fn from(value: i64) -> Self {
        NumberOrText::Number(value)
    }
}

/// Trimmed text, or `None` when absent or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
