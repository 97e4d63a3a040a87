#![allow(dead_code)]

use asb_portal::application::auth::password_digest;
use asb_portal::config::Config;
use asb_portal::infrastructure::disk::DiskFileStore;
use asb_portal::infrastructure::gateway::{SIGNATURE_HEADER, SandboxGateway, WebhookVerifier};
use asb_portal::infrastructure::in_memory::{self, OutboxMailer};
use asb_portal::interfaces::http::{self, AppState, SharedState};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const ADMIN_EMAIL: &str = "asb@school.example.org";
pub const MAX_UPLOAD_BYTES: usize = 1024;

pub struct TestApp {
    pub state: SharedState,
    pub router: Router,
    pub mailer: OutboxMailer,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let digest = password_digest(ADMIN_PASSWORD);
        let config = Config::from_lookup(|key| match key {
            "ADMIN_PASSWORD_SHA256" => Some(digest.clone()),
            "WEBHOOK_SECRET" => Some(WEBHOOK_SECRET.to_string()),
            "PUBLIC_URL" => Some("https://asb.example.org".to_string()),
            "ADMIN_NOTIFY_EMAIL" => Some(ADMIN_EMAIL.to_string()),
            "MAX_UPLOAD_BYTES" => Some(MAX_UPLOAD_BYTES.to_string()),
            _ => None,
        })
        .unwrap();

        let upload_dir = tempfile::tempdir().unwrap();
        let files = DiskFileStore::open(upload_dir.path()).await.unwrap();
        let mailer = OutboxMailer::new();

        let state = AppState::new(
            &config,
            in_memory::stores(),
            Arc::new(SandboxGateway::new(&config.public_url)),
            Arc::new(mailer.clone()),
            Arc::new(files),
        );

        Self {
            router: http::router(state.clone()),
            state,
            mailer,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a JSON request and returns the status with the decoded body
    /// (`Null` when empty).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body), None).await
    }

    /// Logs in and returns the `Cookie` header value for admin calls.
    pub async fn login(&self) -> String {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": ADMIN_USER, "password": ADMIN_PASSWORD }).to_string(),
            ))
            .unwrap();
        let response = self.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn admin(
        &self,
        cookie: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.call(method, uri, body, Some(cookie)).await
    }

    /// Delivers a webhook signed with the configured secret.
    pub async fn webhook(&self, event: &Value) -> (StatusCode, Value) {
        let body = event.to_string();
        let signature = WebhookVerifier::new(WEBHOOK_SECRET)
            .sign(body.as_bytes(), Utc::now())
            .unwrap();
        self.raw_webhook(body, Some(signature)).await
    }

    pub async fn raw_webhook(&self, body: String, signature: Option<String>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/payment")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        let response = self.send(builder.body(Body::from(body)).unwrap()).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    /// Creates a product through the admin API and returns its id.
    pub async fn create_product(&self, cookie: &str, name: &str, price: &str, stock: u32) -> String {
        let (status, product) = self
            .admin(
                cookie,
                Method::POST,
                "/api/admin/products",
                Some(json!({ "name": name, "price": price, "stock": stock })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{product}");
        product["id"].as_str().unwrap().to_string()
    }

    pub async fn stock_of(&self, product_id: &str) -> u64 {
        let (status, product) = self.get(&format!("/api/products/{product_id}")).await;
        assert_eq!(status, StatusCode::OK);
        product["stock"].as_u64().unwrap()
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

pub fn payment_event(id: &str, kind: &str, purchase_id: &str) -> Value {
    json!({
        "id": id,
        "type": kind,
        "data": {
            "reference_id": purchase_id,
            "payment_id": format!("pay_{id}"),
        }
    })
}
