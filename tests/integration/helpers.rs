//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use stowage_api::{AppState, build_app};
use stowage_core::config::{AppConfig, CatalogBackend};
use stowage_core::traits::BlobStore;
use stowage_core::types::{SizeMb, UserId};
use stowage_database::{Catalog, MemoryCatalog};
use stowage_service::UserService;
use stowage_storage::LocalBlobStore;

/// Shared development password used by every test app.
pub const DEV_PASSWORD: &str = "integration-pass";

const BOUNDARY: &str = "stowage-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Catalog for direct assertions
    pub catalog: Arc<dyn Catalog>,
    /// Application config
    pub config: AppConfig,
    /// Storage root, removed on drop
    pub root: TempDir,
    users: UserService,
}

impl TestApp {
    /// Create a new test application over an in-memory catalog and a tempdir
    pub async fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create storage root");

        let mut config = AppConfig::default();
        config.database.backend = CatalogBackend::Memory;
        config.storage.root_path = root.path().to_string_lossy().into_owned();
        config.auth.dev_password = DEV_PASSWORD.to_string();
        config.auth.token_secret = "integration-secret".to_string();

        let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new());
        let blobs: Arc<dyn BlobStore> = Arc::new(
            LocalBlobStore::new(root.path())
                .await
                .expect("Failed to init storage"),
        );

        let users = UserService::new(Arc::clone(&catalog), config.storage.default_total_storage_mb);
        let router = build_app(AppState::new(config.clone(), Arc::clone(&catalog), blobs));

        Self {
            router,
            catalog,
            config,
            root,
            users,
        }
    }

    /// Create a test user with the default quota and return their ID
    pub async fn create_test_user(&self, full_name: &str) -> UserId {
        self.users
            .create_user(full_name, None, None)
            .await
            .expect("Failed to create test user")
            .id
    }

    /// Create a test user with an explicit quota in MB
    pub async fn create_user_with_quota(&self, full_name: &str, quota_mb: u32) -> UserId {
        self.users
            .create_user(full_name, None, Some(SizeMb::from_whole_mb(quota_mb)))
            .await
            .expect("Failed to create test user")
            .id
    }

    /// Login and return the bearer token
    pub async fn login(&self, user_id: UserId) -> String {
        let body = serde_json::json!({
            "user_id": user_id,
            "password": DEV_PASSWORD,
        });

        let response = self
            .request("POST", "/api/auth/login", Some(body), None)
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        response.body["data"]["token"]
            .as_str()
            .expect("No token in login response")
            .to_string()
    }

    /// Create a user and log them in
    pub async fn signed_in(&self, full_name: &str) -> (UserId, String) {
        let user_id = self.create_test_user(full_name).await;
        let token = self.login(user_id).await;
        (user_id, token)
    }

    /// Make a JSON HTTP request to the test app
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
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// POST a multipart form to the test app
    pub async fn upload(&self, path: &str, parts: &[Part<'_>], token: &str) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::from(multipart_body(parts)))
            .expect("Failed to build request");

        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// One part of a multipart form
pub enum Part<'a> {
    /// A file part named `files`
    File {
        /// Client filename, possibly with a relative path
        filename: &'a str,
        /// Content
        data: &'a [u8],
    },
    /// A text field
    Text {
        /// Field name
        name: &'a str,
        /// Field value
        value: &'a str,
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { filename, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub bytes: Bytes,
    /// Parsed JSON body (`Null` when not JSON)
    pub body: Value,
}

impl TestResponse {
    /// The `data` payload of a success body
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of an error body
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
