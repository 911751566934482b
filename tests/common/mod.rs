#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use liftlog::{
    auth::{
        code::CodeGenerator, delivery::CodeSender, jwt::JwtKeys, password::Argon2Hasher,
        repo::MemoryUserStore, services::AuthService,
    },
    build_app,
    config::JwtConfig,
    exercises::repo::MemoryExerciseStore,
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// Hands out 100000, 100001, ... so tests know each code up front.
pub struct SequenceCodes(AtomicUsize);

impl CodeGenerator for SequenceCodes {
    fn generate(&self) -> String {
        format!("{:06}", self.0.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct Outbox(pub Mutex<Vec<(String, String)>>);

#[async_trait]
impl CodeSender for Outbox {
    async fn send(&self, email: &str, code: &str) -> anyhow::Result<()> {
        self.0.lock().unwrap().push((email.to_string(), code.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub keys: JwtKeys,
    pub outbox: Arc<Outbox>,
    pub users: Arc<MemoryUserStore>,
    pub exercises: Arc<MemoryExerciseStore>,
}

pub fn test_keys() -> JwtKeys {
    JwtKeys::from_config(&JwtConfig {
        secret: "integration-secret".into(),
        issuer: "liftlog-test".into(),
        audience: "liftlog-test-users".into(),
        ttl_minutes: 5,
    })
}

pub fn spawn_app(require_verified_login: bool) -> TestApp {
    let keys = test_keys();
    let outbox = Arc::new(Outbox::default());
    let users = Arc::new(MemoryUserStore::new());
    let exercises = Arc::new(MemoryExerciseStore::new());

    let auth = AuthService {
        users: users.clone(),
        hasher: Arc::new(Argon2Hasher),
        tokens: Arc::new(keys.clone()),
        codes: Arc::new(SequenceCodes(AtomicUsize::new(100_000))),
        sender: outbox.clone(),
        require_verified_login,
    };
    let state = AppState::from_parts(auth, exercises.clone());

    TestApp {
        router: build_app(state),
        keys,
        outbox,
        users,
        exercises,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// POST a body verbatim, for payloads that are not valid JSON.
    pub async fn post_raw(&self, uri: &str, content_type: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn signup(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/signup",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/login",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    pub fn last_code(&self) -> String {
        self.outbox.0.lock().unwrap().last().unwrap().1.clone()
    }
}
