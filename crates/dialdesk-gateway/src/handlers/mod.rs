// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers, one module per resource.

pub mod calls;
pub mod contacts;
pub mod groups;
pub mod health;
pub mod templates;

use serde::{Deserialize, Serialize};

use dialdesk_core::TemplateId;

/// Body returned by DELETE endpoints.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub detail: String,
}

impl Deleted {
    pub fn new(entity: &str, id: impl std::fmt::Display) -> Self {
        Self {
            detail: format!("{entity} {id} deleted"),
        }
    }
}

/// `?template_id=` on endpoints that can copy a prompt template.
#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    #[serde(default)]
    pub template_id: Option<i64>,
}

impl TemplateQuery {
    pub fn template(&self) -> Option<TemplateId> {
        self.template_id.map(TemplateId)
    }
}
