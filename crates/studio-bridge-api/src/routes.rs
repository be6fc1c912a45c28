//! API route definitions

use axum::{middleware, routing::get, Router};

use crate::{
    auth::{require_auth, AuthState},
    handlers::{health_check, lti_get, lti_post, unity_get, unity_post, version_info, AppState},
};

/// Build the API router.
///
/// `/health` and `/version` are public; everything under `/v1` requires a
/// bearer token.
pub fn build_router(state: AppState, auth_state: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version_info))
        .with_state(state.clone());

    let v1_routes = build_v1_routes()
        .layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    Router::new().merge(public_routes).nest("/v1", v1_routes)
}

/// Build v1 API routes
fn build_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/unity", get(unity_get).post(unity_post))
        .route("/lti/{usage_key_string}", get(lti_get).post(lti_post))
}
