// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt template snapshots and per-contact placeholder rendering.
//!
//! A template is copied into a call or contact script when selected; later
//! template edits never reach existing scripts. Placeholders are filled in
//! only at dispatch time, once per contact.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use dialdesk_core::{Contact, PromptTemplate};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

/// Copy a template's content by value.
pub fn snapshot(template: &PromptTemplate) -> String {
    template.content.clone()
}

/// Fill `{{name}}`, `{{company}}`, `{{phone}}` and `{{email}}` from `contact`.
///
/// Missing optional values render as empty text. Unknown placeholders are
/// left verbatim.
pub fn render<'a>(script: &'a str, contact: &Contact) -> Cow<'a, str> {
    PLACEHOLDER.replace_all(script, |caps: &Captures<'_>| {
        let value = match &caps[1] {
            "name" => Some(contact.name.as_str()),
            "phone" => Some(contact.phone.as_str()),
            "company" => Some(contact.company.as_deref().unwrap_or_default()),
            "email" => Some(contact.email.as_deref().unwrap_or_default()),
            _ => None,
        };
        match value {
            Some(v) => v.to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// The script placed for one contact: the call's snapshot when it has one,
/// otherwise the contact's own script, rendered for that contact.
pub fn script_for(call_script: Option<&str>, contact: &Contact) -> Option<String> {
    call_script
        .or(contact.script.as_deref())
        .map(|s| render(s, contact).into_owned())
}
