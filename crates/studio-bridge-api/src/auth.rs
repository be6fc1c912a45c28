//! Authentication middleware
//!
//! All authoring routes require a bearer token. The authenticated user is
//! stored in the request extensions as [`AuthUser`].

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use studio_bridge_core::UserId;
use tracing::debug;

use crate::{
    error::ErrorResponse,
    jwt::{bearer_token, Claims, JwtManager, TokenError},
};

/// Extension for storing authenticated user claims in requests
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    /// The acting user, taken from the token subject
    pub fn user_id(&self) -> UserId {
        self.claims.author()
    }
}

/// Authentication state containing JWT manager
#[derive(Clone)]
pub struct AuthState {
    jwt_manager: Arc<JwtManager>,
}

impl AuthState {
    pub fn new(jwt_manager: JwtManager) -> Self {
        Self {
            jwt_manager: Arc::new(jwt_manager),
        }
    }

    pub fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }
}

/// Required authentication middleware
///
/// Rejects the request with 401 unless it carries a valid
/// `Authorization: Bearer <token>` header.
///
/// ```rust,no_run
/// use axum::{Router, routing::get, middleware};
/// use studio_bridge_api::auth::{require_auth, AuthState};
/// use studio_bridge_api::jwt::{JwtConfig, JwtManager};
///
/// # fn example() {
/// let auth_state = AuthState::new(JwtManager::new(JwtConfig::new("secret")).unwrap());
///
/// let app: Router = Router::new()
///     .route("/protected", get(|| async { "Protected content" }))
///     .layer(middleware::from_fn_with_state(auth_state, require_auth));
/// # }
/// ```
pub async fn require_auth(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = bearer_token(auth_header).map_err(|_| AuthError::InvalidToken)?;

    let claims = auth_state
        .jwt_manager
        .verify(token)
        .map_err(|e| match e {
            TokenError::Expired => AuthError::ExpiredToken,
            other => {
                debug!(error = %other, "Rejected bearer token");
                AuthError::InvalidToken
            }
        })?;

    debug!(user = %claims.author(), "User authenticated");

    request.extensions_mut().insert(AuthUser::new(claims));

    Ok(next.run(request).await)
}

/// Authentication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,

    /// Invalid token format or signature
    InvalidToken,

    ExpiredToken,
}

impl AuthError {
    fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Missing authentication token",
            AuthError::InvalidToken => "Invalid authentication token",
            AuthError::ExpiredToken => "Authentication token has expired",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;
        let error_response = ErrorResponse {
            status: status.as_u16(),
            error: self.message().to_string(),
            code: None,
            timestamp: chrono::Utc::now(),
        };

        (status, axum::Json(error_response)).into_response()
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtConfig;
    use axum::{body::Body, extract::Extension, http::Request, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn create_test_jwt_manager() -> JwtManager {
        let config = JwtConfig::new("test-secret-key")
            .with_issuer("test")
            .with_audience("test");
        JwtManager::new(config).unwrap()
    }

    async fn protected_handler(Extension(user): Extension<AuthUser>) -> String {
        format!("Hello, {}", user.user_id())
    }

    fn app(auth_state: AuthState) -> Router {
        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(auth_state, require_auth))
    }

    #[tokio::test]
    async fn test_require_auth_with_valid_token() {
        let jwt_manager = create_test_jwt_manager();
        let token = jwt_manager.issue_token("user123").unwrap();

        let request = Request::builder()
            .uri("/protected")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app(AuthState::new(jwt_manager)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_require_auth_without_token() {
        let request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .unwrap();

        let response = app(AuthState::new(create_test_jwt_manager()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_with_invalid_token() {
        let request = Request::builder()
            .uri("/protected")
            .header(AUTHORIZATION, "Bearer invalid.token.here")
            .body(Body::empty())
            .unwrap();

        let response = app(AuthState::new(create_test_jwt_manager()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_rejects_other_scheme() {
        let request = Request::builder()
            .uri("/protected")
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let response = app(AuthState::new(create_test_jwt_manager()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_user_is_token_author() {
        let auth_user = AuthUser::new(Claims::new(" user123 ", "test", "test", 3600));
        assert_eq!(auth_user.user_id(), UserId::new("user123"));
    }
}
