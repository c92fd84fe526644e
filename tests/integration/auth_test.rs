//! Login, refresh rotation and logout over HTTP.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use crate::helpers::{PASSWORD, TestApp};

fn refresh_token(pair: &serde_json::Value) -> String {
    pair["refresh_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login_returns_token_pair() {
    let app = TestApp::new().await;
    let pair = app.login("admin", PASSWORD).await;

    assert_eq!(pair["token_type"], "Bearer");
    assert_eq!(pair["expires_in"], 3600);
    assert!(pair["access_token"].as_str().is_some());
    assert!(pair["refresh_token"].as_str().is_some());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new().await;
    let response = app
        .request(
            "POST",
            "/v1/login",
            Some(json!({ "username": "admin", "password": "nope" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "wrong username or password");
}

#[tokio::test]
async fn test_logout_revokes_access_token() {
    let app = TestApp::new().await;
    let pair = app.login("admin", PASSWORD).await;
    let access = pair["access_token"].as_str().unwrap();

    let response = app
        .request(
            "DELETE",
            "/v1/login/refresh_token",
            Some(json!({ "refresh_token": refresh_token(&pair) })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.request("GET", "/v1/users", None, Some(access)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "token has been revoked");
}

#[tokio::test]
async fn test_logout_twice_succeeds() {
    let app = TestApp::new().await;
    let pair = app.login("kim", PASSWORD).await;
    let body = json!({ "refresh_token": refresh_token(&pair) });

    for _ in 0..2 {
        let response = app
            .request("DELETE", "/v1/login/refresh_token", Some(body.clone()), None)
            .await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn test_refresh_chain_revokes_previous_token() {
    let app = TestApp::new().await;
    let first = app.login("admin", PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/v1/login/refresh_token",
            Some(json!({ "refresh_token": refresh_token(&first) })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let second = response.body;

    let response = app
        .request(
            "POST",
            "/v1/login/refresh_token",
            Some(json!({ "refresh_token": refresh_token(&second) })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/v1/login/refresh_token",
            Some(json!({ "refresh_token": refresh_token(&first) })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "token has been revoked");

    let old_access = first["access_token"].as_str().unwrap();
    let response = app.request("GET", "/v1/users", None, Some(old_access)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_beyond_relogin_window() {
    let app = TestApp::new().await;
    let admin = app.state.users.get(1).await.unwrap();
    let now = Utc::now().timestamp();
    let pair = app
        .state
        .tokens
        .mint(&admin, now - 8 * 86_400, now)
        .await
        .unwrap();

    let response = app
        .request(
            "POST",
            "/v1/login/refresh_token",
            Some(json!({ "refresh_token": pair.refresh_token })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body["message"],
        "refresh token usage without log in exceeded"
    );
}

#[tokio::test]
async fn test_missing_bearer_token() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/v1/users", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
