// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Dialdesk call scheduling service.
//!
//! Holds the error type, entity types shared across adapter boundaries, the
//! [`ScheduledCall`] record with its status state machine and retry policy,
//! and the adapter traits implemented by storage and telephony backends.

pub mod call;
pub mod error;
pub mod traits;
pub mod types;

pub use call::{
    CallOutcome, CallPlan, CallRecord, CallStatus, CallTarget, CallTiming, CallType,
    MAX_RETRY_INTERVAL_MINUTES, RetryPolicy, ScheduledCall, TransitionError, apply_outcome,
    compute_next_retry, is_storable, latest_storable_instant,
};
pub use error::{DialdeskError, FieldError, FieldErrorCode, ValidationErrors};
pub use types::{
    AdapterType, CallId, CallReport, Contact, ContactDraft, ContactId, Dialog, DialogDraft,
    DialogId, DialogMessage, DialogRole, Group, GroupDraft, GroupId, HealthStatus,
    PlaceCallRequest, PromptTemplate, TemplateDraft, TemplateId,
};

pub use traits::{PluginAdapter, StorageAdapter, TelephonyAdapter};
