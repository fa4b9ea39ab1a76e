// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dialdesk service.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::call::TransitionError;
use crate::types::CallId;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum DialdeskError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Client-correctable input errors, every violated field listed.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A compare-and-set write lost against a concurrent writer.
    #[error("call {call_id} was modified concurrently (expected revision {expected_revision})")]
    Conflict {
        call_id: CallId,
        expected_revision: i64,
    },

    /// The requested lifecycle change is not legal from the record's status.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// The record still has dependents that block the operation.
    #[error("{0}")]
    InUse(String),

    /// Telephony provider errors (transport failure, rejected request).
    #[error("telephony error: {message}")]
    Telephony {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Machine-readable reason attached to a [`FieldError`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    /// The field is required but absent or blank.
    Required,
    /// The field could not be parsed.
    Malformed,
    /// The referenced entity does not exist.
    NotFound,
    /// The field conflicts with another supplied field.
    Conflict,
    /// The instant is not strictly after the submission instant.
    NotInFuture,
    /// The window end is not strictly after its start.
    WindowOrder,
    /// The numeric value is outside the accepted range.
    OutOfRange,
}

/// A single violated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Wire name of the offending field.
    pub field: String,
    pub code: FieldErrorCode,
    /// Human-readable explanation.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

/// Every violation found while validating one request.
///
/// Validators collect all errors before returning; an empty list is never
/// constructed through [`ValidationErrors::into_result`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, field: &str, code: FieldErrorCode, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, code, message));
    }

    /// Append every violation from `other`.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether any violation was recorded for `field`.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Whether a violation with `code` was recorded for `field`.
    pub fn has_code(&self, field: &str, code: FieldErrorCode) -> bool {
        self.errors
            .iter()
            .any(|e| e.field == field && e.code == code)
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        for (i, e) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{} ({})", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
