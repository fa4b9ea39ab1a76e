// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validators for contacts, groups, prompt templates and dialogs.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use dialdesk_core::{
    Contact, ContactDraft, DialogDraft, DialogMessage, FieldErrorCode, Group, GroupDraft,
    PromptTemplate, TemplateDraft, ValidationErrors,
};

use super::{non_blank, parse_instant};

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Contact fields as sent by the client. Every field is optional so the
/// same shape serves partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ContactInput {
    /// Fill every field the patch leaves out from `existing`.
    pub fn merged_over(self, existing: &Contact) -> ContactInput {
        ContactInput {
            name: self.name.or_else(|| Some(existing.name.clone())),
            phone: self.phone.or_else(|| Some(existing.phone.clone())),
            email: self.email.or_else(|| existing.email.clone()),
            company: self.company.or_else(|| existing.company.clone()),
            script: self.script.or_else(|| existing.script.clone()),
            tags: self.tags.or_else(|| Some(existing.tags.clone())),
        }
    }
}

/// Trim tags, drop empty ones and keep the first occurrence of duplicates.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

pub fn validate_contact(input: &ContactInput) -> Result<ContactDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = non_blank(input.name.as_deref());
    if name.is_none() {
        errors.push("name", FieldErrorCode::Required, "name is required");
    }

    let phone = non_blank(input.phone.as_deref());
    match &phone {
        None => errors.push("phone", FieldErrorCode::Required, "phone is required"),
        Some(p) if !PHONE_PATTERN.is_match(p) => {
            errors.push("phone", FieldErrorCode::Malformed, "invalid phone number")
        }
        Some(_) => {}
    }

    let email = non_blank(input.email.as_deref());
    if let Some(e) = &email
        && !EMAIL_PATTERN.is_match(e)
    {
        errors.push("email", FieldErrorCode::Malformed, "invalid email address");
    }

    let draft = ContactDraft {
        name: name.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        email,
        company: non_blank(input.company.as_deref()),
        script: non_blank(input.script.as_deref()),
        tags: normalize_tags(input.tags.iter().flatten()),
    };
    errors.into_result(draft)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl GroupInput {
    pub fn merged_over(self, existing: &Group) -> GroupInput {
        GroupInput {
            name: self.name.or_else(|| Some(existing.name.clone())),
            description: self.description.or_else(|| existing.description.clone()),
        }
    }
}

pub fn validate_group(input: &GroupInput) -> Result<GroupDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = non_blank(input.name.as_deref());
    if name.is_none() {
        errors.push("name", FieldErrorCode::Required, "group name is required");
    }
    let draft = GroupDraft {
        name: name.unwrap_or_default(),
        description: non_blank(input.description.as_deref()),
    };
    errors.into_result(draft)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl TemplateInput {
    pub fn merged_over(self, existing: &PromptTemplate) -> TemplateInput {
        TemplateInput {
            name: self.name.or_else(|| Some(existing.name.clone())),
            content: self.content.or_else(|| Some(existing.content.clone())),
        }
    }
}

pub fn validate_template(input: &TemplateInput) -> Result<TemplateDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = non_blank(input.name.as_deref());
    if name.is_none() {
        errors.push("name", FieldErrorCode::Required, "template name is required");
    }
    // Content is kept verbatim: leading whitespace can matter in a script.
    let content = input
        .content
        .clone()
        .filter(|c| !c.trim().is_empty());
    if content.is_none() {
        errors.push("content", FieldErrorCode::Required, "template content is required");
    }
    let draft = TemplateDraft {
        name: name.unwrap_or_default(),
        content: content.unwrap_or_default(),
    };
    errors.into_result(draft)
}

/// A dialog appended by an external collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogInput {
    /// Defaults to the submission instant.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub messages: Vec<DialogMessage>,
    #[serde(default)]
    pub transcript: Option<String>,
}

pub fn validate_dialog(
    input: &DialogInput,
    now: DateTime<Utc>,
) -> Result<DialogDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let date = match non_blank(input.date.as_deref()) {
        None => now,
        Some(raw) => parse_instant(&raw).unwrap_or_else(|| {
            errors.push(
                "date",
                FieldErrorCode::Malformed,
                format!("date is not a valid ISO-8601 date-time: '{raw}'"),
            );
            now
        }),
    };

    for (i, message) in input.messages.iter().enumerate() {
        if message.text.trim().is_empty() {
            errors.push(
                &format!("messages[{i}].text"),
                FieldErrorCode::Required,
                "message text is required",
            );
        }
    }

    let transcript = non_blank(input.transcript.as_deref());
    if input.messages.is_empty() && transcript.is_none() {
        errors.push(
            "messages",
            FieldErrorCode::Required,
            "a dialog needs at least one message or a transcript",
        );
    }

    let draft = DialogDraft {
        date,
        messages: input.messages.clone(),
        transcript,
    };
    errors.into_result(draft)
}
