//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceExt;

use glim_api::AppState;
use glim_core::config::AppConfig;
use glim_core::config::bootstrap::BootstrapConfig;
use glim_database::DatabasePool;
use glim_database::migration::run_migrations;
use glim_ldap::{LdapHandler, serve_listener};
use glim_session::memory::MemorySessionStore;

/// Password shared by every provisioned account.
pub const PASSWORD: &str = "test";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for minting tokens directly
    pub state: AppState,
    /// Catalog pool, shared with the LDAP listener
    pub db: DatabasePool,
}

impl TestApp {
    /// Create a new test application over an in-memory catalog with
    /// `admin`, `search`, `saul`, `kim` and `mike` provisioned.
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.api.secret = "integration-secret".to_string();
        config.ldap.no_tls = true;
        config.bootstrap = BootstrapConfig {
            initial_admin_passwd: Some(PASSWORD.to_string()),
            initial_search_passwd: Some(PASSWORD.to_string()),
            initial_users: Some("saul,kim,mike".to_string()),
            initial_users_password: Some(PASSWORD.to_string()),
        };
        config.validate().expect("Invalid test config");

        let db = DatabasePool::connect_url("sqlite::memory:", 1, Duration::from_secs(5))
            .await
            .expect("Failed to open catalog");
        run_migrations(&db).await.expect("Failed to run migrations");

        let config = Arc::new(config);
        let sessions = Arc::new(MemorySessionStore::new());
        let state = AppState::new(config.clone(), db.clone(), sessions);
        glim_service::ensure_bootstrap_accounts(&state.users, &config.bootstrap)
            .await
            .expect("Failed to provision accounts");

        let router = glim_api::build_router(state.clone());
        Self { router, state, db }
    }

    /// Login and return the parsed token pair
    pub async fn login(&self, username: &str, password: &str) -> Value {
        let response = self
            .request(
                "POST",
                "/v1/login",
                Some(serde_json::json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "Login failed: {:?}", response.body);
        response.body
    }

    /// Login and return the access token only
    pub async fn access_token(&self, username: &str) -> String {
        self.login(username, PASSWORD).await["access_token"]
            .as_str()
            .expect("No access_token in login response")
            .to_string()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let req = req.body(Body::from(body_str)).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Start a plain LDAP listener over the same catalog.
    pub async fn start_ldap(&self) -> LdapListener {
        let handler = Arc::new(
            LdapHandler::new(&self.state.config.ldap, &self.db).expect("Failed to build handler"),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        let (tx, rx) = watch::channel(false);
        tokio::spawn(serve_listener(listener, handler, None, Duration::from_secs(1), rx));
        LdapListener {
            url: format!("ldap://{addr}"),
            _shutdown: tx,
        }
    }
}

/// A running LDAP listener; stops when dropped.
pub struct LdapListener {
    pub url: String,
    _shutdown: watch::Sender<bool>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
