// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telephony adapter trait for outbound call providers.

use async_trait::async_trait;

use crate::error::DialdeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CallReport, PlaceCallRequest};

/// Adapter for the external telephony provider that actually rings phones.
///
/// `Err` means the request never reached a usable provider response
/// (transport failure, rejection). A call that was placed but not answered
/// is an `Ok` report with `answered == false`.
#[async_trait]
pub trait TelephonyAdapter: PluginAdapter {
    /// Place one outbound call and wait for its report.
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<CallReport, DialdeskError>;
}
