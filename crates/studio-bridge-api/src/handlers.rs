//! API request handlers
//!
//! `unity_*` back the Unity authoring view (block creation) and `lti_*`
//! back the LTI view (Studio edit dispatch).

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Extension, OriginalUri, Path, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use studio_bridge_service::{CreateBlockRequest, ServiceError, ServiceRegistry};
use tracing::{debug, info, instrument};

use crate::{
    auth::AuthUser,
    convert::{handler_request, into_http_response},
    error::{ApiError, ApiResult},
    responses::{ComponentHealth, HealthResponse},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceRegistry>,
}

impl AppState {
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

// ============================================================================
// Unity view
// ============================================================================

/// Placeholder payload for the Unity view
#[instrument]
pub async fn unity_get() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// Create a block under `parent_locator`
#[instrument(skip(state, user, payload), fields(user = %user.user_id()))]
pub async fn unity_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = CreateBlockRequest::from_json(body)?;

    debug!(
        parent = ?request.parent_locator,
        category = ?request.category,
        "Creating block"
    );

    match state
        .services
        .creation()
        .create_block(request, &user.user_id())
        .await
    {
        Ok(response) => {
            info!(locator = %response.locator, "Block created");
            Ok(Json(response).into_response())
        }
        // Studio clients read this body from a 200 response
        Err(err @ ServiceError::DuplicateNotImplemented) => {
            Ok(Json(json!({ "error": err.to_string() })).into_response())
        }
        Err(err) => Err(ApiError::from(err)),
    }
}

// ============================================================================
// LTI view
// ============================================================================

/// Placeholder payload for the LTI view
#[instrument]
pub async fn lti_get(Path(usage_key_string): Path<String>) -> Json<Value> {
    debug!(usage_key = %usage_key_string, "LTI view requested");
    Json(json!({ "success": true }))
}

/// Forward the request to the target's Studio edit handler
#[instrument(skip(state, user, uri, headers, body), fields(user = %user.user_id()))]
pub async fn lti_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(usage_key_string): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let request = handler_request(&method, &uri, &headers, body);

    let response = state
        .services
        .dispatch()
        .dispatch_studio_edits(&usage_key_string, request, &user.user_id())
        .await?;

    debug!(status = response.status, "Dispatched Studio edits");

    into_http_response(response)
}

// ============================================================================
// Health & Info Handlers
// ============================================================================

/// Health check; 503 when the content store is unreachable
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> HealthResponse {
    let store_health = match state.services.store().ping().await {
        Ok(()) => ComponentHealth::healthy(),
        Err(e) => ComponentHealth::unhealthy(format!("Store error: {}", e)),
    };

    HealthResponse::healthy()
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_check("store", store_health)
        .with_check("service", ComponentHealth::healthy())
        .compute_status()
}

/// Get API version information
#[instrument]
pub async fn version_info() -> Json<VersionInfo> {
    Json(VersionInfo::current())
}

/// Version information
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,

    pub api_version: String,

    pub build_timestamp: String,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            api_version: "v1".to_string(),
            build_timestamp: option_env!("BUILD_TIMESTAMP")
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info_creation() {
        let info = VersionInfo::current();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.api_version, "v1");
    }

    #[tokio::test]
    async fn test_unity_get_placeholder() {
        let Json(body) = unity_get().await;
        assert_eq!(body, json!({"success": true}));
    }
}
