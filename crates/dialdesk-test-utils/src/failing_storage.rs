// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper whose dialog writes always fail.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dialdesk_core::{
    AdapterType, CallId, CallPlan, CallStatus, Contact, ContactDraft, ContactId, DialdeskError,
    Dialog, DialogDraft, Group, GroupDraft, GroupId, HealthStatus, PluginAdapter, PromptTemplate,
    ScheduledCall, StorageAdapter, TemplateDraft, TemplateId,
};

/// Delegates to an inner adapter, except that `append_dialog` returns a
/// storage error.
pub struct FailingDialogStorage {
    inner: Arc<dyn StorageAdapter + Send + Sync>,
}

impl FailingDialogStorage {
    pub fn new(inner: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl PluginAdapter for FailingDialogStorage {
    fn name(&self) -> &str {
        "failing-dialogs"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DialdeskError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), DialdeskError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FailingDialogStorage {
    async fn initialize(&self) -> Result<(), DialdeskError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), DialdeskError> {
        self.inner.close().await
    }

    async fn create_contact(
        &self,
        draft: &ContactDraft,
        now: DateTime<Utc>,
    ) -> Result<Contact, DialdeskError> {
        self.inner.create_contact(draft, now).await
    }

    async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>, DialdeskError> {
        self.inner.get_contact(id).await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, DialdeskError> {
        self.inner.list_contacts().await
    }

    async fn update_contact(
        &self,
        id: ContactId,
        draft: &ContactDraft,
        now: DateTime<Utc>,
    ) -> Result<Option<Contact>, DialdeskError> {
        self.inner.update_contact(id, draft, now).await
    }

    async fn delete_contact(&self, id: ContactId) -> Result<bool, DialdeskError> {
        self.inner.delete_contact(id).await
    }

    async fn append_dialog(
        &self,
        _contact_id: ContactId,
        _draft: &DialogDraft,
    ) -> Result<Dialog, DialdeskError> {
        Err(DialdeskError::Storage {
            source: "disk full".into(),
        })
    }

    async fn list_dialogs(&self, contact_id: ContactId) -> Result<Vec<Dialog>, DialdeskError> {
        self.inner.list_dialogs(contact_id).await
    }

    async fn create_group(
        &self,
        draft: &GroupDraft,
        now: DateTime<Utc>,
    ) -> Result<Group, DialdeskError> {
        self.inner.create_group(draft, now).await
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, DialdeskError> {
        self.inner.get_group(id).await
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DialdeskError> {
        self.inner.list_groups().await
    }

    async fn update_group(
        &self,
        id: GroupId,
        draft: &GroupDraft,
    ) -> Result<Option<Group>, DialdeskError> {
        self.inner.update_group(id, draft).await
    }

    async fn delete_group(&self, id: GroupId) -> Result<bool, DialdeskError> {
        self.inner.delete_group(id).await
    }

    async fn add_group_member(
        &self,
        group_id: GroupId,
        contact_id: ContactId,
    ) -> Result<bool, DialdeskError> {
        self.inner.add_group_member(group_id, contact_id).await
    }

    async fn remove_group_member(
        &self,
        group_id: GroupId,
        contact_id: ContactId,
    ) -> Result<bool, DialdeskError> {
        self.inner.remove_group_member(group_id, contact_id).await
    }

    async fn list_group_contacts(&self, group_id: GroupId) -> Result<Vec<Contact>, DialdeskError> {
        self.inner.list_group_contacts(group_id).await
    }

    async fn create_template(
        &self,
        draft: &TemplateDraft,
        now: DateTime<Utc>,
    ) -> Result<PromptTemplate, DialdeskError> {
        self.inner.create_template(draft, now).await
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<PromptTemplate>, DialdeskError> {
        self.inner.get_template(id).await
    }

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, DialdeskError> {
        self.inner.list_templates().await
    }

    async fn update_template(
        &self,
        id: TemplateId,
        draft: &TemplateDraft,
    ) -> Result<Option<PromptTemplate>, DialdeskError> {
        self.inner.update_template(id, draft).await
    }

    async fn delete_template(&self, id: TemplateId) -> Result<bool, DialdeskError> {
        self.inner.delete_template(id).await
    }

    async fn insert_call(
        &self,
        plan: &CallPlan,
        now: DateTime<Utc>,
    ) -> Result<ScheduledCall, DialdeskError> {
        self.inner.insert_call(plan, now).await
    }

    async fn get_call(&self, id: CallId) -> Result<Option<ScheduledCall>, DialdeskError> {
        self.inner.get_call(id).await
    }

    async fn list_calls(
        &self,
        status: Option<CallStatus>,
    ) -> Result<Vec<ScheduledCall>, DialdeskError> {
        self.inner.list_calls(status).await
    }

    async fn list_upcoming_calls(
        &self,
        limit: usize,
    ) -> Result<Vec<ScheduledCall>, DialdeskError> {
        self.inner.list_upcoming_calls(limit).await
    }

    async fn list_due_calls(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledCall>, DialdeskError> {
        self.inner.list_due_calls(now, limit).await
    }

    async fn save_call(&self, call: &ScheduledCall) -> Result<ScheduledCall, DialdeskError> {
        self.inner.save_call(call).await
    }

    async fn delete_call(&self, id: CallId) -> Result<bool, DialdeskError> {
        self.inner.delete_call(id).await
    }

    async fn count_active_calls_for_contact(&self, id: ContactId) -> Result<u64, DialdeskError> {
        self.inner.count_active_calls_for_contact(id).await
    }

    async fn count_active_calls_for_group(&self, id: GroupId) -> Result<u64, DialdeskError> {
        self.inner.count_active_calls_for_group(id).await
    }
}
