// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dialdesk_core::{DialdeskError, StorageAdapter, TelephonyAdapter};
use dialdesk_scheduler::{CallScheduler, Directory, DispatchRunner};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers::{calls, contacts, groups, health, templates};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct ApiState {
    pub scheduler: Arc<CallScheduler>,
    pub directory: Arc<Directory>,
    /// Used for immediate calls.
    pub runner: Arc<DispatchRunner>,
    /// Probed by the health endpoint.
    pub storage: Arc<dyn StorageAdapter + Send + Sync>,
    pub telephony: Arc<dyn TelephonyAdapter + Send + Sync>,
    pub auth: AuthConfig,
}

/// Bind address and credentials.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for auth (None = every API request is rejected).
    pub bearer_token: Option<String>,
}

/// Routes for one collection, reachable with and without a trailing slash.
fn collection<S: Clone + Send + Sync + 'static>(
    router: Router<S>,
    path: &str,
    method_router: axum::routing::MethodRouter<S>,
) -> Router<S> {
    router
        .route(path, method_router.clone())
        .route(&format!("{path}/"), method_router)
}

/// Build the application router.
///
/// - `GET /health` (public)
/// - everything under `/api` (bearer token)
pub fn build_router(state: ApiState) -> Router {
    let auth_state = state.auth.clone();

    let mut api = Router::new();
    api = collection(
        api,
        "/contacts",
        get(contacts::list).post(contacts::create),
    );
    api = collection(api, "/groups", get(groups::list).post(groups::create));
    api = collection(
        api,
        "/prompt-templates",
        get(templates::list).post(templates::create),
    );
    api = collection(
        api,
        "/scheduled-calls",
        get(calls::list).post(calls::create),
    );

    let api = api
        // Contacts
        .route(
            "/contacts/{id}",
            get(contacts::get)
                .put(contacts::update)
                .patch(contacts::update)
                .delete(contacts::remove),
        )
        .route(
            "/contacts/{id}/dialogs",
            get(contacts::list_dialogs).post(contacts::add_dialog),
        )
        .route("/contacts/{id}/tags", post(contacts::add_tags))
        .route("/contacts/{id}/tags/{tag}", delete(contacts::remove_tag))
        // Groups
        .route(
            "/groups/{id}",
            get(groups::get)
                .put(groups::update)
                .patch(groups::update)
                .delete(groups::remove),
        )
        .route("/groups/{id}/members", post(groups::add_member))
        .route(
            "/groups/{id}/members/{contact_id}",
            delete(groups::remove_member),
        )
        .route("/groups/{id}/contacts", get(groups::contacts))
        // Prompt templates
        .route(
            "/prompt-templates/{id}",
            get(templates::get)
                .put(templates::update)
                .patch(templates::update)
                .delete(templates::remove),
        )
        // Scheduled calls
        .route("/scheduled-calls/upcoming", get(calls::upcoming))
        .route(
            "/scheduled-calls/{id}",
            get(calls::get)
                .put(calls::update)
                .patch(calls::update)
                .delete(calls::remove),
        )
        .route("/scheduled-calls/{id}/cancel", post(calls::cancel))
        .route("/scheduled-calls/{id}/outcome", post(calls::record_outcome))
        // Immediate calls
        .route("/calls/immediate", post(calls::immediate))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::get_health))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: ApiState,
    cancel: CancellationToken,
) -> Result<(), DialdeskError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DialdeskError::Config(format!("failed to bind API server to {addr}: {e}")))?;

    tracing::info!("API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| DialdeskError::Internal(format!("API server error: {e}")))?;

    tracing::info!("API server stopped");
    Ok(())
}
