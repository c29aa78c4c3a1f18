mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use edora_api::Settings;

#[tokio::test]
async fn register_login_me() {
    let app = TestApp::new().await;
    let id = app.register("alice@example.com", "user").await;
    let (access, refresh) = app.login("alice@example.com").await;
    assert_ne!(access, refresh);

    let (status, me) = app.get("/api/auth/me", &access).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id);
    assert_eq!(me["email"], "alice@example.com");
    assert_eq!(me["role"], "user");
    assert_eq!(me["points"], 0);
    assert!(me["badge"].is_null());
}

#[tokio::test]
async fn registration_is_validated() {
    let app = TestApp::new().await;
    app.register("bob@example.com", "user").await;

    let cases = [
        (json!({ "email": "bob@example.com", "password": "password123" }), "email already registered"),
        (json!({ "email": "not-an-email", "password": "password123" }), "invalid email address"),
        (json!({ "email": "carol@example.com", "password": "short" }), "password must be at least 8 characters"),
    ];
    for (body, detail) in cases {
        let (status, res) = app.call("POST", "/api/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["detail"], detail);
    }

    // Unknown fields are a shape error, not a semantic one
    let (status, _) = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "d@example.com", "password": "password123", "admin": true })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn requested_role_ignored_unless_enabled() {
    let app = TestApp::with_settings(Settings::default()).await;
    let (status, body) = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "eve@example.com", "password": "password123", "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let app = TestApp::new().await;
    app.register("frank@example.com", "user").await;

    for (email, password) in [("frank@example.com", "wrong-password"), ("nobody@example.com", "password123")] {
        let (status, body) = app
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "invalid credentials");
    }
}

#[tokio::test]
async fn protected_routes_need_a_valid_access_token() {
    let app = TestApp::new().await;
    app.register("gina@example.com", "user").await;
    let (_, refresh) = app.login("gina@example.com").await;

    let (status, _) = app.call("GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/auth/me", "garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A refresh token is not an access token
    let (status, _) = app.get("/api/auth/me", &refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_then_logout_revokes() {
    let app = TestApp::new().await;
    app.register("hank@example.com", "user").await;
    let (access, refresh) = app.login("hank@example.com").await;

    let (status, body) = app
        .call("POST", "/api/auth/refresh", None, Some(json!({ "refresh_token": refresh })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let fresh = body["access_token"].as_str().unwrap().to_string();
    let (status, _) = app.get("/api/auth/me", &fresh).await;
    assert_eq!(status, StatusCode::OK);

    // Access tokens can't be used to refresh
    let (status, _) = app
        .call("POST", "/api/auth/refresh", None, Some(json!({ "refresh_token": access })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("POST", "/api/auth/logout", None, Some(json!({ "refresh_token": refresh })))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call("POST", "/api/auth/refresh", None, Some(json!({ "refresh_token": refresh })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn username_updates() {
    let app = TestApp::new().await;
    let (_, ivy) = app.user("ivy@example.com", "user").await;
    let (_, jay) = app.user("jay@example.com", "user").await;

    let (status, body) = app.put("/api/auth/username", &ivy, json!({ "username": "  ivy  " })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ivy");

    // Setting the same name again is fine
    let (status, _) = app.put("/api/auth/username", &ivy, json!({ "username": "ivy" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.put("/api/auth/username", &jay, json!({ "username": "ivy" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username already taken");

    let (status, _) = app.put("/api/auth/username", &jay, json!({ "username": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put("/api/auth/username", &jay, json!({ "username": "x".repeat(51) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, me) = app.get("/api/auth/me", &ivy).await;
    assert_eq!(me["username"], "ivy");
}

#[tokio::test]
async fn admins_manage_roles() {
    let app = TestApp::new().await;
    let (_, admin) = app.user("root@example.com", "admin").await;
    let (kim_id, kim) = app.user("kim@example.com", "user").await;

    let uri = format!("/api/users/{kim_id}/role");
    let (status, _) = app.put(&uri, &kim, json!({ "role": "admin" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.put(&uri, &admin, json!({ "role": "moderator" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");

    let (status, _) = app.put("/api/users/9999/role", &admin, json!({ "role": "user" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, logs) = app.get("/api/audit-logs", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs[0]["action"], "user.role_update");
    assert_eq!(logs[0]["object_id"], kim_id);
    assert_eq!(logs[0]["data"]["to"], "moderator");

    let (status, _) = app.get("/api/audit-logs", &kim).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn deactivated_users_are_locked_out() {
    let app = TestApp::new().await;
    let (_, admin) = app.user("boss@example.com", "admin").await;
    let lee_id = app.register("lee@example.com", "user").await;
    let (access, refresh) = app.login("lee@example.com").await;

    let uri = format!("/api/users/{lee_id}/active");
    let (status, _) = app.put(&uri, &access, json!({ "is_active": false })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.put(&uri, &admin, json!({ "is_active": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, _) = app.get("/api/auth/me", &access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .call("POST", "/api/auth/refresh", None, Some(json!({ "refresh_token": refresh })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "lee@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "invalid credentials");

    let (status, _) = app.put(&uri, &admin, json!({ "is_active": true })).await;
    assert_eq!(status, StatusCode::OK);
    app.login("lee@example.com").await;
}
