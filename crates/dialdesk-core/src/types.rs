// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Dialdesk service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// The raw database key.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a contact.
    ContactId
);
entity_id!(
    /// Unique identifier for a contact group.
    GroupId
);
entity_id!(
    /// Unique identifier for a scheduled call.
    CallId
);
entity_id!(
    /// Unique identifier for a prompt template.
    TemplateId
);
entity_id!(
    /// Unique identifier for a dialog record.
    DialogId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Identifies the type of adapter in the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Telephony,
}

// --- Contacts ---

/// A person the user calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    /// Free-text agent script.
    pub script: Option<String>,
    /// Insertion-ordered, duplicate-free.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated contact fields, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub script: Option<String>,
    pub tags: Vec<String>,
}

// --- Groups ---

/// A named set of contacts called together by group calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    /// Member contact ids in the order they were added.
    pub members: Vec<ContactId>,
    pub created_at: DateTime<Utc>,
}

/// Validated group fields. Membership is managed separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDraft {
    pub name: String,
    pub description: Option<String>,
}

// --- Prompt templates ---

/// Reusable script text. Copied by value into calls and contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: TemplateId,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDraft {
    pub name: String,
    pub content: String,
}

// --- Dialogs ---

/// Speaker of a dialog message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DialogRole {
    Agent,
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogMessage {
    pub role: DialogRole,
    pub text: String,
}

/// One historical conversation with a contact. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub id: DialogId,
    pub contact_id: ContactId,
    pub date: DateTime<Utc>,
    pub messages: Vec<DialogMessage>,
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogDraft {
    pub date: DateTime<Utc>,
    pub messages: Vec<DialogMessage>,
    pub transcript: Option<String>,
}

// --- Telephony ---

/// A single outbound call handed to the telephony provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCallRequest {
    pub contact_id: ContactId,
    pub phone: String,
    /// Script with placeholders already rendered for this contact.
    pub script: Option<String>,
    /// The scheduled call this placement belongs to, if any.
    pub scheduled_call: Option<CallId>,
}

/// What the telephony provider reports back for one placed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    /// Provider-side call identifier.
    pub call_sid: String,
    /// Whether the callee picked up and the conversation took place.
    pub answered: bool,
    #[serde(default)]
    pub messages: Vec<DialogMessage>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}
