// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `GET /health`, unauthenticated.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use dialdesk_core::{DialdeskError, HealthStatus};

use crate::server::ApiState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` or `unhealthy`.
    pub status: &'static str,
    pub version: &'static str,
    pub storage: String,
    pub telephony: String,
}

fn describe(result: Result<HealthStatus, DialdeskError>) -> HealthStatus {
    result.unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()))
}

fn label(status: &HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "healthy".to_string(),
        HealthStatus::Degraded(reason) => format!("degraded: {reason}"),
        HealthStatus::Unhealthy(reason) => format!("unhealthy: {reason}"),
    }
}

/// Storage decides liveness. An unreachable or unconfigured telephony
/// provider only degrades the service, since CRUD keeps working.
pub async fn get_health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = describe(state.storage.health_check().await);
    let telephony = describe(state.telephony.health_check().await);

    let (code, status) = match (&storage, &telephony) {
        (HealthStatus::Unhealthy(_), _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        (HealthStatus::Healthy, HealthStatus::Healthy) => (StatusCode::OK, "ok"),
        _ => (StatusCode::OK, "degraded"),
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            storage: label(&storage),
            telephony: label(&telephony),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_include_reasons() {
        assert_eq!(label(&HealthStatus::Healthy), "healthy");
        assert_eq!(
            label(&HealthStatus::Degraded("no endpoint".into())),
            "degraded: no endpoint"
        );
    }

    #[test]
    fn health_check_errors_count_as_unhealthy() {
        let status = describe(Err(DialdeskError::Internal("boom".into())));
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }
}
