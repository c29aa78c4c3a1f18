#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use edora_api::storage::Storage;
use edora_api::{AppState, AppStateInner, Settings, build_router};
use edora_db::Database;

pub struct TestApp {
    pub router: Router,
    /// Direct database access for bulk seeding.
    pub state: AppState,
    _uploads: TempDir,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&self.body).into_owned())
        })
    }
}

impl TestApp {
    /// Role signup is enabled so tests can mint moderators and admins.
    pub async fn new() -> Self {
        Self::with_settings(Settings {
            allow_role_signup: true,
            ..Settings::default()
        })
        .await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let storage = Storage::new(uploads.path().to_path_buf()).await.unwrap();
        let state = AppStateInner::new(db, storage, settings);
        Self {
            router: build_router(state.clone()),
            state,
            _uploads: uploads,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.into_body().collect().await.unwrap().to_bytes().to_vec();
        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = self.send(req).await;
        (res.status, res.json())
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call("DELETE", uri, Some(token), None).await
    }

    pub async fn register(&self, email: &str, role: &str) -> i64 {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "email": email, "password": "password123", "role": role })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// Returns `(access_token, refresh_token)`.
    pub async fn login(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    /// Register and log in. Returns `(user_id, access_token)`.
    pub async fn user(&self, email: &str, role: &str) -> (i64, String) {
        let id = self.register(email, role).await;
        let (access, _) = self.login(email).await;
        (id, access)
    }

    pub async fn channel(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self.post("/api/channels", token, json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn new_post(&self, token: &str, channel_id: i64, title: &str, content: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/posts",
                token,
                json!({ "title": title, "content": content, "channel_id": channel_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn points(&self, token: &str) -> i64 {
        let (status, body) = self.get("/api/gamification/my-points", token).await;
        assert_eq!(status, StatusCode::OK);
        body["points"].as_i64().unwrap()
    }
}
