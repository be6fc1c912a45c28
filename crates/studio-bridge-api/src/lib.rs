//! Studio Bridge API Layer
//!
//! Axum routes for the Unity and LTI authoring views.
//!
//! - **Handlers**: request handlers for the `/v1` endpoints plus health and version
//! - **Convert**: translation between axum requests and block handler requests
//! - **Auth / JWT**: bearer token authentication for `/v1`
//! - **Middleware**: tracing, CORS, compression and request ids
//! - **Error Handling**: conversion of service errors to HTTP responses
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use studio_bridge_api::{build_api_server, AuthState, JwtConfig, JwtManager};
//! use studio_bridge_core::BlockRuntime;
//! use studio_bridge_db::InMemoryContentStore;
//! use studio_bridge_service::ServiceRegistry;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let services = ServiceRegistry::new(
//!     Arc::new(InMemoryContentStore::new()),
//!     Arc::new(BlockRuntime::with_defaults()),
//! );
//! let auth_state = AuthState::new(JwtManager::new(JwtConfig::new("secret"))?);
//!
//! let app = build_api_server(services, auth_state);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod convert;
pub mod error;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod responses;
pub mod routes;

// Re-export main types for convenience
pub use auth::{require_auth, AuthState, AuthUser};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{AppState, VersionInfo};
pub use jwt::{Claims, JwtConfig, JwtManager};
pub use middleware::{CorsConfig, MiddlewareConfig, UuidRequestIdGenerator};
pub use responses::{ComponentHealth, HealthResponse, HealthStatus};
pub use routes::build_router;

use axum::Router;
use studio_bridge_service::ServiceRegistry;
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

/// Build a complete API server with default middleware
pub fn build_api_server(services: ServiceRegistry, auth_state: AuthState) -> Router {
    build_api_server_with_config(services, auth_state, MiddlewareConfig::default())
}

/// Build API server with custom middleware configuration
pub fn build_api_server_with_config(
    services: ServiceRegistry,
    auth_state: AuthState,
    middleware_config: MiddlewareConfig,
) -> Router {
    let state = AppState::new(services);
    let mut router = build_router(state, auth_state);

    router = router.layer(middleware_config.cors.into_layer());

    if middleware_config.enable_compression {
        router = router.layer(CompressionLayer::new());
    }

    if middleware_config.enable_tracing {
        router = router.layer(middleware::trace_layer());
    }

    // Outermost so the trace span and the response both see the id
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestIdGenerator))
}
