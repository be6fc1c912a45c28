//! Common test utilities and helpers
//!
//! Each `TestApp` runs a real server on a random local port, backed by a
//! freshly seeded in-memory content store.

#![allow(dead_code)]

use std::sync::Arc;
use studio_bridge_api::{build_api_server, AuthState, JwtConfig, JwtManager};
use studio_bridge_core::BlockRuntime;
use studio_bridge_db::{seed_demo_content, InMemoryContentStore};
use studio_bridge_service::ServiceRegistry;
use tokio::net::TcpListener;

pub const JWT_SECRET: &str = "test-secret-key-for-integration-tests";

/// Test application state
pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryContentStore>,
    pub jwt_manager: Arc<JwtManager>,
}

impl TestApp {
    /// Start a server with the default block catalogue
    pub async fn new() -> Self {
        Self::with_runtime(BlockRuntime::with_defaults()).await
    }

    /// Start a server with a custom block catalogue
    pub async fn with_runtime(runtime: BlockRuntime) -> Self {
        let store = Arc::new(InMemoryContentStore::new());
        seed_demo_content(store.as_ref())
            .await
            .expect("Failed to seed demo content");

        let services = ServiceRegistry::new(store.clone(), Arc::new(runtime));

        let jwt_manager = JwtManager::new(test_jwt_config()).expect("Failed to create JWT manager");
        let app = build_api_server(
            services,
            AuthState::new(JwtManager::new(test_jwt_config()).expect("Failed to create JWT manager")),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to start test server");
        });

        Self {
            address: format!("http://{}", address),
            store,
            jwt_manager: Arc::new(jwt_manager),
        }
    }

    /// Get base URL
    pub fn url(&self) -> &str {
        &self.address
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build client")
    }

    /// Generate test JWT token
    pub fn generate_token(&self, user_id: &str) -> String {
        self.jwt_manager
            .issue_token(user_id)
            .expect("Failed to generate token")
    }

    /// URL of the LTI view for a usage key
    pub fn lti_url(&self, usage_key: &str) -> String {
        format!("{}/v1/lti/{}", self.address, usage_key)
    }

    pub fn unity_url(&self) -> String {
        format!("{}/v1/unity", self.address)
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig::new(JWT_SECRET)
        .with_issuer("test")
        .with_audience("test")
        .with_expiration(3600)
}

/// Helper to make authenticated GET request
pub async fn get_with_auth(client: &reqwest::Client, url: &str, token: &str) -> reqwest::Response {
    client
        .get(url)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
}

/// Helper to make authenticated POST request with a JSON body
pub async fn post_with_auth<T: serde::Serialize>(
    client: &reqwest::Client,
    url: &str,
    token: &str,
    body: &T,
) -> reqwest::Response {
    client
        .post(url)
        .header("Authorization", format!("Bearer {}", token))
        .json(body)
        .send()
        .await
        .expect("Failed to send request")
}

/// Parse JSON response
pub async fn parse_json(response: reqwest::Response) -> serde_json::Value {
    response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse JSON response")
}

/// Assert response status
pub fn assert_status(response: &reqwest::Response, expected: reqwest::StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}
