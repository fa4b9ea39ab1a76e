// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Dialdesk integration tests.
//!
//! Provides a scripted telephony adapter and a harness that wires the
//! scheduler, directory and dispatcher over a temp SQLite database.
//!
//! # Components
//!
//! - [`MockTelephony`] - Telephony adapter with a queue of scripted answers
//! - [`TestHarness`] - Full service stack for integration tests
//! - [`FailingDialogStorage`] - Storage wrapper whose dialog writes fail

pub mod failing_storage;
pub mod harness;
pub mod mock_telephony;

pub use failing_storage::FailingDialogStorage;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_telephony::{MockAnswer, MockTelephony};
