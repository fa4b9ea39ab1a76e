// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call scheduling for Dialdesk.
//!
//! - [`validation`]: request validators that report every violated field
//! - [`CallScheduler`]: scheduled call CRUD with optimistic concurrency
//! - [`Directory`]: contacts, groups, templates and dialogs
//! - [`DispatchRunner`]: polls due calls and places them
//! - [`fanout`] and [`template`]: group expansion and script rendering

pub mod directory;
pub mod dispatcher;
pub mod fanout;
pub mod service;
pub mod template;
pub mod validation;

pub use directory::Directory;
pub use dispatcher::{DispatchRunner, ImmediateCall, TickSummary, WINDOW_ELAPSED};
pub use service::CallScheduler;
pub use validation::{
    CallCandidate, ContactInput, DialogInput, GroupInput, KnownTargets, NumberOrText,
    TargetDirectory, TemplateInput, ValidationContext, validate, validate_update,
};
