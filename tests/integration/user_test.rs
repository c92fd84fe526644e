//! User management and role enforcement over HTTP.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_plain_user_role_enforcement() {
    let app = TestApp::new().await;
    let token = app.access_token("saul").await;

    let response = app.request("GET", "/v1/users", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("GET", "/v1/users/3", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["uid"], 3);
    assert_eq!(response.body["username"], "saul");

    let response = app
        .request("PUT", "/v1/users/3", Some(json!({ "manager": true })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("GET", "/v1/users/4", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reader_can_list_but_not_create() {
    let app = TestApp::new().await;
    let token = app.access_token("search").await;

    let response = app.request("GET", "/v1/users", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("POST", "/v1/users", Some(json!({ "username": "walter" })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_lifecycle() {
    let app = TestApp::new().await;
    let token = app.access_token("admin").await;

    let response = app
        .request(
            "POST",
            "/v1/users",
            Some(json!({
                "username": "walter",
                "firstname": "Walter",
                "lastname": "White",
                "email": "walter@example.org",
                "password": "heisenberg",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["name"], "Walter White");
    let uid = response.body["uid"].as_i64().unwrap();

    let response = app.request("GET", "/v1/users", None, Some(&token)).await;
    let names: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|user| user["username"].as_str())
        .collect();
    assert!(names.contains(&"walter"));

    let path = format!("/v1/users/{uid}");
    let response = app
        .request("PUT", &path, Some(json!({ "email": "heisenberg@example.org" })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", &path, None, Some(&token)).await;
    assert_eq!(response.body["email"], "heisenberg@example.org");

    let response = app
        .request("GET", "/v1/users/walter/uid", None, Some(&token))
        .await;
    assert_eq!(response.body["uid"], uid);

    let response = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.request("GET", &path, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manager_and_readonly_are_exclusive() {
    let app = TestApp::new().await;
    let token = app.access_token("admin").await;

    let response = app
        .request(
            "POST",
            "/v1/users",
            Some(json!({ "username": "gus", "manager": true, "readonly": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn test_password_change_with_old_password() {
    let app = TestApp::new().await;
    let token = app.access_token("kim").await;

    let response = app
        .request(
            "POST",
            "/v1/users/4/passwd",
            Some(json!({ "old_password": "test", "password": "wexler" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT, "{:?}", response.body);

    app.login("kim", "wexler").await;
}
