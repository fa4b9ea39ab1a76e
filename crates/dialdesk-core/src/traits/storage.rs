// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::call::{CallPlan, CallStatus, ScheduledCall};
use crate::error::DialdeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    CallId, Contact, ContactDraft, ContactId, Dialog, DialogDraft, Group, GroupDraft, GroupId,
    PromptTemplate, TemplateDraft, TemplateId,
};

/// Adapter for storage and persistence backends.
///
/// Each entity is an independent aggregate. Lookups return `None` for a
/// missing record; updates and deletes report whether a row was affected.
/// Persistence failures surface as [`DialdeskError::Storage`] and are never
/// retried here.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), DialdeskError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), DialdeskError>;

    // --- Contacts ---

    async fn create_contact(
        &self,
        draft: &ContactDraft,
        now: DateTime<Utc>,
    ) -> Result<Contact, DialdeskError>;

    async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>, DialdeskError>;

    /// All contacts ordered by id.
    async fn list_contacts(&self) -> Result<Vec<Contact>, DialdeskError>;

    async fn update_contact(
        &self,
        id: ContactId,
        draft: &ContactDraft,
        now: DateTime<Utc>,
    ) -> Result<Option<Contact>, DialdeskError>;

    /// Deletes the contact, its dialogs and its group memberships.
    async fn delete_contact(&self, id: ContactId) -> Result<bool, DialdeskError>;

    // --- Dialogs ---

    async fn append_dialog(
        &self,
        contact_id: ContactId,
        draft: &DialogDraft,
    ) -> Result<Dialog, DialdeskError>;

    /// Dialogs for one contact, newest first.
    async fn list_dialogs(&self, contact_id: ContactId) -> Result<Vec<Dialog>, DialdeskError>;

    // --- Groups ---

    async fn create_group(
        &self,
        draft: &GroupDraft,
        now: DateTime<Utc>,
    ) -> Result<Group, DialdeskError>;

    /// The group with its current members.
    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, DialdeskError>;

    async fn list_groups(&self) -> Result<Vec<Group>, DialdeskError>;

    async fn update_group(
        &self,
        id: GroupId,
        draft: &GroupDraft,
    ) -> Result<Option<Group>, DialdeskError>;

    /// Deletes the group. Member contacts are kept.
    async fn delete_group(&self, id: GroupId) -> Result<bool, DialdeskError>;

    /// Returns `false` when the contact already was a member.
    async fn add_group_member(
        &self,
        group_id: GroupId,
        contact_id: ContactId,
    ) -> Result<bool, DialdeskError>;

    async fn remove_group_member(
        &self,
        group_id: GroupId,
        contact_id: ContactId,
    ) -> Result<bool, DialdeskError>;

    /// Current member contacts in membership order.
    async fn list_group_contacts(&self, group_id: GroupId) -> Result<Vec<Contact>, DialdeskError>;

    // --- Prompt templates ---

    async fn create_template(
        &self,
        draft: &TemplateDraft,
        now: DateTime<Utc>,
    ) -> Result<PromptTemplate, DialdeskError>;

    async fn get_template(&self, id: TemplateId) -> Result<Option<PromptTemplate>, DialdeskError>;

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, DialdeskError>;

    async fn update_template(
        &self,
        id: TemplateId,
        draft: &TemplateDraft,
    ) -> Result<Option<PromptTemplate>, DialdeskError>;

    async fn delete_template(&self, id: TemplateId) -> Result<bool, DialdeskError>;

    // --- Scheduled calls ---

    /// Persist a new `pending` call at revision 1.
    async fn insert_call(
        &self,
        plan: &CallPlan,
        now: DateTime<Utc>,
    ) -> Result<ScheduledCall, DialdeskError>;

    async fn get_call(&self, id: CallId) -> Result<Option<ScheduledCall>, DialdeskError>;

    /// All calls, optionally filtered by status, ordered by id.
    async fn list_calls(
        &self,
        status: Option<CallStatus>,
    ) -> Result<Vec<ScheduledCall>, DialdeskError>;

    /// `pending` and `retrying` calls ordered by their next due instant.
    async fn list_upcoming_calls(&self, limit: usize)
    -> Result<Vec<ScheduledCall>, DialdeskError>;

    /// Calls whose next attempt is due at or before `now`, oldest due first.
    async fn list_due_calls(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledCall>, DialdeskError>;

    /// Compare-and-set write of a call produced by a lifecycle transition.
    ///
    /// Succeeds only when the stored revision still equals
    /// `call.revision()`; returns the stored record with its bumped
    /// revision. A stale revision yields [`DialdeskError::Conflict`], a
    /// missing row [`DialdeskError::NotFound`].
    async fn save_call(&self, call: &ScheduledCall) -> Result<ScheduledCall, DialdeskError>;

    async fn delete_call(&self, id: CallId) -> Result<bool, DialdeskError>;

    /// Non-terminal individual calls targeting the contact.
    async fn count_active_calls_for_contact(&self, id: ContactId) -> Result<u64, DialdeskError>;

    /// Non-terminal group calls targeting the group.
    async fn count_active_calls_for_group(&self, id: GroupId) -> Result<u64, DialdeskError>;
}
