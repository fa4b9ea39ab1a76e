// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contacts, groups, prompt templates and dialog history.
//!
//! Validation and referential checks sit here so the HTTP layer only maps
//! requests and errors. Deleting a contact or group is refused while a
//! pending or retrying call still targets it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use dialdesk_core::{
    Contact, ContactId, DialdeskError, Dialog, FieldErrorCode, Group, GroupId, PromptTemplate,
    StorageAdapter, TemplateId, ValidationErrors,
};

use crate::service::{copy_template, with_extra};
use crate::validation::{
    ContactInput, DialogInput, GroupInput, TemplateInput, normalize_tags, validate_contact,
    validate_dialog, validate_group, validate_template,
};

fn not_found(entity: &'static str, id: i64) -> DialdeskError {
    DialdeskError::NotFound { entity, id }
}

/// CRUD over the address book and its supporting records.
pub struct Directory {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
}

impl Directory {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self { storage }
    }

    // --- Contacts ---

    pub async fn create_contact(
        &self,
        mut input: ContactInput,
        template_id: Option<TemplateId>,
        now: DateTime<Utc>,
    ) -> Result<Contact, DialdeskError> {
        let template_errors = copy_template(&*self.storage, &mut input.script, template_id).await?;
        let draft = with_extra(validate_contact(&input), template_errors)?;
        let contact = self.storage.create_contact(&draft, now).await?;
        info!(contact_id = %contact.id, "contact created");
        Ok(contact)
    }

    pub async fn get_contact(&self, id: ContactId) -> Result<Contact, DialdeskError> {
        self.storage
            .get_contact(id)
            .await?
            .ok_or_else(|| not_found("contact", id.get()))
    }

    /// All contacts, optionally only those carrying `tag`.
    pub async fn list_contacts(&self, tag: Option<&str>) -> Result<Vec<Contact>, DialdeskError> {
        let contacts = self.storage.list_contacts().await?;
        Ok(match tag.map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => contacts
                .into_iter()
                .filter(|c| c.tags.iter().any(|t| t == tag))
                .collect(),
            None => contacts,
        })
    }

    pub async fn update_contact(
        &self,
        id: ContactId,
        mut patch: ContactInput,
        template_id: Option<TemplateId>,
        now: DateTime<Utc>,
    ) -> Result<Contact, DialdeskError> {
        let existing = self.get_contact(id).await?;
        let template_errors = copy_template(&*self.storage, &mut patch.script, template_id).await?;
        let draft = with_extra(validate_contact(&patch.merged_over(&existing)), template_errors)?;
        self.storage
            .update_contact(id, &draft, now)
            .await?
            .ok_or_else(|| not_found("contact", id.get()))
    }

    /// Delete a contact with its dialogs and group memberships.
    pub async fn delete_contact(&self, id: ContactId) -> Result<(), DialdeskError> {
        self.get_contact(id).await?;
        let active = self.storage.count_active_calls_for_contact(id).await?;
        if active > 0 {
            return Err(DialdeskError::InUse(format!(
                "contact {id} still has {active} pending or retrying scheduled call(s)"
            )));
        }
        if !self.storage.delete_contact(id).await? {
            return Err(not_found("contact", id.get()));
        }
        info!(contact_id = %id, "contact deleted");
        Ok(())
    }

    /// Add tags, keeping existing order and skipping duplicates.
    pub async fn add_tags(
        &self,
        id: ContactId,
        tags: &[String],
        now: DateTime<Utc>,
    ) -> Result<Contact, DialdeskError> {
        let existing = self.get_contact(id).await?;
        let merged = normalize_tags(existing.tags.iter().chain(tags));
        self.save_tags(existing, merged, now).await
    }

    pub async fn remove_tag(
        &self,
        id: ContactId,
        tag: &str,
        now: DateTime<Utc>,
    ) -> Result<Contact, DialdeskError> {
        let existing = self.get_contact(id).await?;
        let tag = tag.trim();
        if !existing.tags.iter().any(|t| t == tag) {
            let mut errors = ValidationErrors::new();
            errors.push(
                "tag",
                FieldErrorCode::NotFound,
                format!("contact {id} has no tag '{tag}'"),
            );
            return Err(errors.into());
        }
        let remaining: Vec<String> = existing.tags.iter().filter(|t| *t != tag).cloned().collect();
        self.save_tags(existing, remaining, now).await
    }

    async fn save_tags(
        &self,
        existing: Contact,
        tags: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Contact, DialdeskError> {
        let id = existing.id;
        let patch = ContactInput {
            tags: Some(tags),
            ..ContactInput::default()
        };
        let draft = validate_contact(&patch.merged_over(&existing))?;
        self.storage
            .update_contact(id, &draft, now)
            .await?
            .ok_or_else(|| not_found("contact", id.get()))
    }

    // --- Dialogs ---

    pub async fn add_dialog(
        &self,
        contact_id: ContactId,
        input: &DialogInput,
        now: DateTime<Utc>,
    ) -> Result<Dialog, DialdeskError> {
        self.get_contact(contact_id).await?;
        let draft = validate_dialog(input, now)?;
        self.storage.append_dialog(contact_id, &draft).await
    }

    /// A contact's dialogs, newest first.
    pub async fn dialogs(&self, contact_id: ContactId) -> Result<Vec<Dialog>, DialdeskError> {
        self.get_contact(contact_id).await?;
        self.storage.list_dialogs(contact_id).await
    }

    // --- Groups ---

    pub async fn create_group(
        &self,
        input: &GroupInput,
        now: DateTime<Utc>,
    ) -> Result<Group, DialdeskError> {
        let draft = validate_group(input)?;
        let group = self.storage.create_group(&draft, now).await?;
        info!(group_id = %group.id, "group created");
        Ok(group)
    }

    pub async fn get_group(&self, id: GroupId) -> Result<Group, DialdeskError> {
        self.storage
            .get_group(id)
            .await?
            .ok_or_else(|| not_found("group", id.get()))
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, DialdeskError> {
        self.storage.list_groups().await
    }

    pub async fn update_group(&self, id: GroupId, patch: GroupInput) -> Result<Group, DialdeskError> {
        let existing = self.get_group(id).await?;
        let draft = validate_group(&patch.merged_over(&existing))?;
        self.storage
            .update_group(id, &draft)
            .await?
            .ok_or_else(|| not_found("group", id.get()))
    }

    /// Delete a group. Its member contacts are kept.
    pub async fn delete_group(&self, id: GroupId) -> Result<(), DialdeskError> {
        self.get_group(id).await?;
        let active = self.storage.count_active_calls_for_group(id).await?;
        if active > 0 {
            return Err(DialdeskError::InUse(format!(
                "group {id} still has {active} pending or retrying scheduled call(s)"
            )));
        }
        if !self.storage.delete_group(id).await? {
            return Err(not_found("group", id.get()));
        }
        info!(group_id = %id, "group deleted");
        Ok(())
    }

    /// Add a member. Adding an existing member is a no-op.
    pub async fn add_member(
        &self,
        group_id: GroupId,
        contact_id: ContactId,
    ) -> Result<Group, DialdeskError> {
        self.get_group(group_id).await?;
        if self.storage.get_contact(contact_id).await?.is_none() {
            let mut errors = ValidationErrors::new();
            errors.push(
                "contact_id",
                FieldErrorCode::NotFound,
                format!("contact {contact_id} does not exist"),
            );
            return Err(errors.into());
        }
        if self.storage.add_group_member(group_id, contact_id).await? {
            info!(group_id = %group_id, contact_id = %contact_id, "group member added");
        }
        self.get_group(group_id).await
    }

    pub async fn remove_member(
        &self,
        group_id: GroupId,
        contact_id: ContactId,
    ) -> Result<Group, DialdeskError> {
        self.get_group(group_id).await?;
        if !self.storage.remove_group_member(group_id, contact_id).await? {
            return Err(not_found("group member", contact_id.get()));
        }
        info!(group_id = %group_id, contact_id = %contact_id, "group member removed");
        self.get_group(group_id).await
    }

    /// Member contacts, resolved now.
    pub async fn group_contacts(&self, group_id: GroupId) -> Result<Vec<Contact>, DialdeskError> {
        self.get_group(group_id).await?;
        self.storage.list_group_contacts(group_id).await
    }

    // --- Prompt templates ---

    pub async fn create_template(
        &self,
        input: &TemplateInput,
        now: DateTime<Utc>,
    ) -> Result<PromptTemplate, DialdeskError> {
        let draft = validate_template(input)?;
        self.storage.create_template(&draft, now).await
    }

    pub async fn get_template(&self, id: TemplateId) -> Result<PromptTemplate, DialdeskError> {
        self.storage
            .get_template(id)
            .await?
            .ok_or_else(|| not_found("prompt template", id.get()))
    }

    /// Templates, newest first.
    pub async fn list_templates(&self) -> Result<Vec<PromptTemplate>, DialdeskError> {
        self.storage.list_templates().await
    }

    /// Edit a template. Scripts copied from it earlier are not affected.
    pub async fn update_template(
        &self,
        id: TemplateId,
        patch: TemplateInput,
    ) -> Result<PromptTemplate, DialdeskError> {
        let existing = self.get_template(id).await?;
        let draft = validate_template(&patch.merged_over(&existing))?;
        self.storage
            .update_template(id, &draft)
            .await?
            .ok_or_else(|| not_found("prompt template", id.get()))
    }

    pub async fn delete_template(&self, id: TemplateId) -> Result<(), DialdeskError> {
        if !self.storage.delete_template(id).await? {
            return Err(not_found("prompt template", id.get()));
        }
        Ok(())
    }
}
