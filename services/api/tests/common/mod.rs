//! Shared harness for the API integration tests: the real router on top of the
//! in-memory store and canned AI replies.

#![allow(dead_code)]

use api_lib::{config::Config, web};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use text_review_core::ports::DatabaseService;
use text_review_core::testing::{InMemoryDatabase, StubCorrector, StubTranslator};
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub db: Arc<InMemoryDatabase>,
    pub router: Router,
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().expect("valid socket address"),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        openai_api_key: None,
        correction_model: "test-model".to_string(),
        translation_model: "test-model".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        session_ttl_days: 1,
    }
}

impl TestApp {
    pub fn with_ai(corrector: StubCorrector, translator: StubTranslator) -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        let state = web::AppState::new(
            db.clone(),
            Arc::new(test_config()),
            Arc::new(corrector),
            Arc::new(translator),
        );
        Self { db, router: web::router(Arc::new(state)) }
    }

    pub fn new() -> Self {
        Self::with_ai(
            StubCorrector::replying("I have an apple."),
            StubTranslator::replying(Some("Tôi có một quả táo.")),
        )
    }

    /// Creates a user with an open session and returns `(user_id, token)`.
    pub async fn signed_in(&self, username: &str) -> (Uuid, String) {
        let user = self
            .db
            .create_user(username, &format!("{username}@example.com"), "hash")
            .await
            .expect("user created");
        let token = Uuid::new_v4().to_string();
        self.db
            .create_auth_session(&token, user.id, Utc::now() + Duration::hours(1))
            .await
            .expect("session created");
        (user.id, token)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("session={token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");
        self.call(request).await
    }

    /// Runs a prebuilt request. The body must be JSON (or empty).
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("infallible router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Submits a text through the API and returns its id.
    pub async fn create_text(&self, token: &str, user_text: &str) -> String {
        let (status, body) = self
            .post("/api/texts", Some(token), serde_json::json!({ "userText": user_text }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["_id"].as_str().expect("text id").to_string()
    }
}
