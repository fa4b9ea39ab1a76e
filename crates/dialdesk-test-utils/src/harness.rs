// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` assembles the scheduler, directory and dispatcher over a
//! temp SQLite database and a [`MockTelephony`].

use std::sync::Arc;

use dialdesk_config::model::{DialdeskConfig, SchedulingConfig, StorageConfig};
use dialdesk_core::{DialdeskError, StorageAdapter, TelephonyAdapter};
use dialdesk_scheduler::{CallScheduler, Directory, DispatchRunner};
use dialdesk_storage::SqliteStorage;

use crate::mock_telephony::{MockAnswer, MockTelephony};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    answers: Vec<MockAnswer>,
    max_attempts: Option<u32>,
    retry_horizon_hours: Option<u32>,
    default_retry_interval: Option<u32>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            answers: Vec::new(),
            max_attempts: None,
            retry_horizon_hours: None,
            default_retry_interval: None,
        }
    }

    /// Script the telephony answers, consumed in call order.
    pub fn with_answers(mut self, answers: Vec<MockAnswer>) -> Self {
        self.answers = answers;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_retry_horizon_hours(mut self, hours: u32) -> Self {
        self.retry_horizon_hours = Some(hours);
        self
    }

    pub fn with_default_retry_interval(mut self, minutes: u32) -> Self {
        self.default_retry_interval = Some(minutes);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, DialdeskError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| DialdeskError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let storage = SqliteStorage::new(storage_config.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter + Send + Sync> = Arc::new(storage);

        let defaults = SchedulingConfig::default();
        let scheduling = SchedulingConfig {
            max_attempts: self.max_attempts,
            retry_horizon_hours: self.retry_horizon_hours,
            default_retry_interval: self
                .default_retry_interval
                .unwrap_or(defaults.default_retry_interval),
            ..defaults
        };
        let config = DialdeskConfig {
            storage: storage_config,
            scheduling,
            ..DialdeskConfig::default()
        };

        let telephony = Arc::new(MockTelephony::with_answers(self.answers));
        let telephony_dyn: Arc<dyn TelephonyAdapter + Send + Sync> = telephony.clone();

        let scheduler = Arc::new(CallScheduler::new(storage.clone(), &config.scheduling));
        let directory = Arc::new(Directory::new(storage.clone()));
        let runner = Arc::new(DispatchRunner::new(
            storage.clone(),
            telephony_dyn,
            &config.scheduling,
            &config.dispatch,
        ));

        Ok(TestHarness {
            storage,
            telephony,
            scheduler,
            directory,
            runner,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock provider and temp storage.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter + Send + Sync>,
    /// The scripted telephony provider.
    pub telephony: Arc<MockTelephony>,
    pub scheduler: Arc<CallScheduler>,
    pub directory: Arc<Directory>,
    pub runner: Arc<DispatchRunner>,
    /// Configuration the services were built from.
    pub config: DialdeskConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}
