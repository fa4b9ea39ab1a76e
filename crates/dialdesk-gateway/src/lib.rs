// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST API for Dialdesk.
//!
//! Exposes contacts, groups, prompt templates, dialogs and scheduled calls
//! under `/api`, guarded by a bearer token. `GET /health` is public.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{ApiState, ServerConfig, build_router, start_server};
