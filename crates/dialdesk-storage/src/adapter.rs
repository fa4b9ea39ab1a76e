// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use dialdesk_config::model::StorageConfig;
use dialdesk_core::{
    AdapterType, CallId, CallPlan, CallStatus, Contact, ContactDraft, ContactId, DialdeskError,
    Dialog, DialogDraft, Group, GroupDraft, GroupId, HealthStatus, PluginAdapter, PromptTemplate,
    ScheduledCall, StorageAdapter, TemplateDraft, TemplateId,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules. The
/// database is opened by [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The database is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, DialdeskError> {
        self.db.get().ok_or_else(|| DialdeskError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), DialdeskError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DialdeskError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DialdeskError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), DialdeskError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| DialdeskError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DialdeskError> {
        self.db()?;
        self.checkpoint().await
    }

    // --- Contacts ---

    async fn create_contact(
        &self,
        draft: &ContactDraft,
        now: DateTime<Utc>,
    ) -> Result<Contact, DialdeskError> {
        queries::contacts::create_contact(self.db()?, draft, now).await
    }

    async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>, DialdeskError> {
        queries::contacts::get_contact(self.db()?, id).await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, DialdeskError> {
        queries::contacts::list_contacts(self.db()?).await
    }

    async fn update_contact(
        &self,
        id: ContactId,
        draft: &ContactDraft,
        now: DateTime<Utc>,
    ) -> Result<Option<Contact>, DialdeskError> {
        queries::contacts::update_contact(self.db()?, id, draft, now).await
    }

    async fn delete_contact(&self, id: ContactId) -> Result<bool, DialdeskError> {
        queries::contacts::delete_contact(self.db()?, id).await
    }

    // --- Dialogs ---

    async fn append_dialog(
        &self,
        contact_id: ContactId,
        draft: &DialogDraft,
    ) -> Result<Dialog, DialdeskError> {
        queries::dialogs::append_dialog(self.db()?, contact_id, draft).await
    }

    async fn list_dialogs(&self, contact_id: ContactId) -> Result<Vec<Dialog>, DialdeskError> {
        queries::dialogs::list_dialogs(self.db()?, contact_id).await
    }

    // --- Groups ---

    async fn create_group(
        &self,
        draft: &GroupDraft,
        now: DateTime<Utc>,
    ) -> Result<Group, DialdeskError> {
        queries::groups::create_group(self.db()?, draft, now).await
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, DialdeskError> {
        queries::groups::get_group(self.db()?, id).await
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DialdeskError> {
        queries::groups::list_groups(self.db()?).await
    }

    async fn update_group(
        &self,
        id: GroupId,
        draft: &GroupDraft,
    ) -> Result<Option<Group>, DialdeskError> {
        queries::groups::update_group(self.db()?, id, draft).await
    }

    async fn delete_group(&self, id: GroupId) -> Result<bool, DialdeskError> {
        queries::groups::delete_group(self.db()?, id).await
    }

    async fn add_group_member(
        &self,
        group_id: GroupId,
        contact_id: ContactId,
    ) -> Result<bool, DialdeskError> {
        queries::groups::add_member(self.db()?, group_id, contact_id).await
    }

    async fn remove_group_member(
        &self,
        group_id: GroupId,
        contact_id: ContactId,
    ) -> Result<bool, DialdeskError> {
        queries::groups::remove_member(self.db()?, group_id, contact_id).await
    }

    async fn list_group_contacts(&self, group_id: GroupId) -> Result<Vec<Contact>, DialdeskError> {
        queries::groups::list_group_contacts(self.db()?, group_id).await
    }

    // --- Prompt templates ---

    async fn create_template(
        &self,
        draft: &TemplateDraft,
        now: DateTime<Utc>,
    ) -> Result<PromptTemplate, DialdeskError> {
        queries::templates::create_template(self.db()?, draft, now).await
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<PromptTemplate>, DialdeskError> {
        queries::templates::get_template(self.db()?, id).await
    }

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, DialdeskError> {
        queries::templates::list_templates(self.db()?).await
    }

    async fn update_template(
        &self,
        id: TemplateId,
        draft: &TemplateDraft,
    ) -> Result<Option<PromptTemplate>, DialdeskError> {
        queries::templates::update_template(self.db()?, id, draft).await
    }

    async fn delete_template(&self, id: TemplateId) -> Result<bool, DialdeskError> {
        queries::templates::delete_template(self.db()?, id).await
    }

    // --- Scheduled calls ---

    async fn insert_call(
        &self,
        plan: &CallPlan,
        now: DateTime<Utc>,
    ) -> Result<ScheduledCall, DialdeskError> {
        queries::calls::insert_call(self.db()?, plan, now).await
    }

    async fn get_call(&self, id: CallId) -> Result<Option<ScheduledCall>, DialdeskError> {
        queries::calls::get_call(self.db()?, id).await
    }

    async fn list_calls(
        &self,
        status: Option<CallStatus>,
    ) -> Result<Vec<ScheduledCall>, DialdeskError> {
        queries::calls::list_calls(self.db()?, status).await
    }

    async fn list_upcoming_calls(
        &self,
        limit: usize,
    ) -> Result<Vec<ScheduledCall>, DialdeskError> {
        queries::calls::list_upcoming_calls(self.db()?, limit).await
    }

    async fn list_due_calls(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledCall>, DialdeskError> {
        queries::calls::list_due_calls(self.db()?, now, limit).await
    }

    async fn save_call(&self, call: &ScheduledCall) -> Result<ScheduledCall, DialdeskError> {
        queries::calls::save_call(self.db()?, call).await
    }

    async fn delete_call(&self, id: CallId) -> Result<bool, DialdeskError> {
        queries::calls::delete_call(self.db()?, id).await
    }

    async fn count_active_calls_for_contact(&self, id: ContactId) -> Result<u64, DialdeskError> {
        queries::calls::count_active_for_contact(self.db()?, id).await
    }

    async fn count_active_calls_for_group(&self, id: GroupId) -> Result<u64, DialdeskError> {
        queries::calls::count_active_for_group(self.db()?, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_tracks_initialization() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn queries_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        let err = storage.list_contacts().await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[tokio::test]
    async fn close_and_shutdown_checkpoint() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("shutdown.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        storage
            .create_template(
                &TemplateDraft {
                    name: "Intro".to_string(),
                    content: "Hi".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        storage.close().await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
