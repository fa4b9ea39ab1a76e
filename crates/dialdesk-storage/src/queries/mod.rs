// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per aggregate.

pub mod calls;
pub mod contacts;
pub mod dialogs;
pub mod groups;
pub mod templates;
