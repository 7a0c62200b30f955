#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use quill_api::{create_app, AppState};
use quill_llm::checker::ContentChecker;
use quill_llm::mock::ScriptedClient;
use quill_store::{SeedCategory, SeedUser, Store};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const ALICE: &str = "tok-alice";
pub const BOB: &str = "tok-bob";
pub const ADMIN: &str = "tok-admin";

pub struct TestApp {
    pub router: Router,
    pub store: Store,
    pub llm: Arc<ScriptedClient>,
}

pub async fn app_with(llm: ScriptedClient) -> TestApp {
    let store = Store::connect("sqlite::memory:", 1).await.expect("pool");
    store.bootstrap().await.expect("schema");
    let seed = |name: &str, staff: bool| SeedUser {
        username: name.into(),
        email: format!("{name}@example.com"),
        token: format!("tok-{name}"),
        is_staff: staff,
        ..SeedUser::default()
    };
    store
        .seed_users(&[seed("alice", false), seed("bob", false), seed("admin", true)])
        .await
        .expect("users");
    store
        .seed_categories(&[SeedCategory {
            name: "Technologie".into(),
            description: "Logiciels".into(),
        }])
        .await
        .expect("categories");
    store
        .seed_tags(&["rust".to_string()])
        .await
        .expect("tags");

    let llm = Arc::new(llm);
    let state = AppState::new(store.clone(), ContentChecker::new(llm.clone()));
    TestApp {
        router: create_app(state),
        store,
        llm,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => req
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => req.body(Body::empty()),
        }
        .expect("request");

        let resp = self.router.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    /// Create an article as `token` and return its id.
    pub async fn article(&self, token: &str, title: &str, status: &str) -> i64 {
        let (code, body) = self
            .send(
                Method::POST,
                "/api/articles/",
                Some(token),
                Some(serde_json::json!({
                    "title": title,
                    "content": format!("Contenu de {title}"),
                    "excerpt": "Résumé",
                    "status": status,
                })),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("id")
    }
}
