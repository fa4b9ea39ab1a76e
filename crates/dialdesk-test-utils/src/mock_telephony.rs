// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock telephony adapter for deterministic testing.
//!
//! `MockTelephony` implements `TelephonyAdapter` with scripted answers and
//! records every request it receives.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use dialdesk_core::{
    AdapterType, CallReport, DialdeskError, DialogMessage, DialogRole, HealthStatus,
    PlaceCallRequest, PluginAdapter, TelephonyAdapter,
};

/// One scripted provider answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAnswer {
    /// The callee picked up.
    Answered,
    /// The call went through but nobody answered, with a reason.
    NoAnswer(String),
    /// The provider rejected the request.
    Error(String),
}

/// A mock telephony provider.
///
/// Answers are popped from a FIFO queue. When the queue is empty, calls are
/// answered.
pub struct MockTelephony {
    answers: Arc<Mutex<VecDeque<MockAnswer>>>,
    placed: Arc<Mutex<Vec<PlaceCallRequest>>>,
}

impl MockTelephony {
    /// Create a mock that answers every call.
    pub fn new() -> Self {
        Self::with_answers(Vec::new())
    }

    /// Create a mock pre-loaded with the given answers.
    pub fn with_answers(answers: Vec<MockAnswer>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(VecDeque::from(answers))),
            placed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an answer to the end of the queue.
    pub async fn add_answer(&self, answer: MockAnswer) {
        self.answers.lock().await.push_back(answer);
    }

    /// Every request placed so far, in order.
    pub async fn placed(&self) -> Vec<PlaceCallRequest> {
        self.placed.lock().await.clone()
    }

    pub async fn placed_count(&self) -> usize {
        self.placed.lock().await.len()
    }
}

impl Default for MockTelephony {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTelephony {
    fn name(&self) -> &str {
        "mock-telephony"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Telephony
    }

    async fn health_check(&self) -> Result<HealthStatus, DialdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DialdeskError> {
        Ok(())
    }
}

#[async_trait]
impl TelephonyAdapter for MockTelephony {
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<CallReport, DialdeskError> {
        let sequence = {
            let mut placed = self.placed.lock().await;
            placed.push(request.clone());
            placed.len()
        };
        let answer = self
            .answers
            .lock()
            .await
            .pop_front()
            .unwrap_or(MockAnswer::Answered);
        let call_sid = format!("CA-mock-{sequence}");

        match answer {
            MockAnswer::Answered => {
                let mut messages = Vec::new();
                if let Some(script) = &request.script {
                    messages.push(DialogMessage {
                        role: DialogRole::Agent,
                        text: script.clone(),
                    });
                }
                messages.push(DialogMessage {
                    role: DialogRole::Client,
                    text: "Hello?".to_string(),
                });
                Ok(CallReport {
                    call_sid,
                    answered: true,
                    messages,
                    transcript: Some("Hello?".to_string()),
                    failure_reason: None,
                })
            }
            MockAnswer::NoAnswer(reason) => Ok(CallReport {
                call_sid,
                answered: false,
                messages: Vec::new(),
                transcript: None,
                failure_reason: Some(reason),
            }),
            MockAnswer::Error(message) => Err(DialdeskError::Telephony {
                message,
                source: None,
            }),
        }
    }
}
