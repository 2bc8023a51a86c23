#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use stylist_storage::{LocalStorage, StorageConfig};
use tempfile::TempDir;
use tower::ServiceExt;

use stylist_api::auth::jwt::{generate_access_token, JwtConfig};
use stylist_api::auth::password::hash_password;
use stylist_api::catalog::CatalogResponse;
use stylist_api::config::{AdminCredentials, ServerConfig};
use stylist_api::router::build_app_router;
use stylist_api::state::AppState;

pub const ADMIN_PASSWORD: &str = "tailor-test-password";
const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: JWT_SECRET.to_string(),
        access_token_expiry_mins: 60,
    }
}

/// Build a test `ServerConfig` with local storage under `storage_dir`.
pub fn test_config(storage_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        catalog_path: None,
        jwt: jwt_config(),
        admin: AdminCredentials {
            password_hash: hash_password(ADMIN_PASSWORD).expect("hashing should succeed"),
        },
        storage: StorageConfig::local(storage_dir),
    }
}

/// A router over `pool` plus the temp directory backing its storage.
pub struct TestApp {
    pub router: Router,
    pub storage_dir: TempDir,
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with_catalog(pool, CatalogResponse::default())
}

/// Same middleware stack as production, with a given static catalog.
pub fn build_test_app_with_catalog(pool: PgPool, static_catalog: CatalogResponse) -> TestApp {
    let storage_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(storage_dir.path());
    let storage = Arc::new(LocalStorage::new(
        storage_dir.path(),
        config.storage.local_base_url(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage,
        static_catalog: Arc::new(static_catalog),
    };

    TestApp {
        router: build_app_router(state, &config),
        storage_dir,
    }
}

/// A valid admin bearer token for the test secret.
pub fn admin_token() -> String {
    generate_access_token("admin", "admin", &jwt_config()).expect("token generation")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request failed")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body, None).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_request(app, Method::POST, uri, body, Some(token)).await
}

pub async fn patch_json_auth(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    json_request(app, Method::PATCH, uri, body, Some(token)).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    send(app, request).await
}

/// POST a single-file multipart form.
pub async fn post_file(
    app: &Router,
    uri: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Response<Body> {
    let boundary = "stylist-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
