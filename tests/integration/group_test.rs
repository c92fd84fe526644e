//! Group management over HTTP.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_duplicate_group() {
    let app = TestApp::new().await;
    let token = app.access_token("admin").await;
    let body = json!({ "name": "devel", "description": "Developers" });

    let response = app
        .request("POST", "/v1/groups", Some(body.clone()), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["gid"], 1);
    assert_eq!(response.body["name"], "devel");

    let response = app.request("POST", "/v1/groups", Some(body), Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "message": "group already exists" }));
}

#[tokio::test]
async fn test_guacamole_parameters_require_protocol() {
    let app = TestApp::new().await;
    let token = app.access_token("admin").await;

    let response = app
        .request(
            "POST",
            "/v1/groups",
            Some(json!({
                "name": "rdp",
                "description": "Remote desktop",
                "guac_config_parameters": "hostname=10.0.0.1",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(
        response.body["message"],
        "Apache Guacamole config protocol is required"
    );
}

#[tokio::test]
async fn test_members_and_lookup() {
    let app = TestApp::new().await;
    let token = app.access_token("admin").await;

    let response = app
        .request(
            "POST",
            "/v1/groups",
            Some(json!({ "name": "lawyers", "description": "Lawyers", "members": ["saul"] })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let gid = response.body["gid"].as_i64().unwrap();

    let response = app
        .request(
            "POST",
            &format!("/v1/groups/{gid}/members"),
            Some(json!({ "members": ["kim"] })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["members"].as_array().unwrap().len(), 2);

    let response = app
        .request("GET", "/v1/groups/lawyers/gid", None, Some(&token))
        .await;
    assert_eq!(response.body["gid"], gid);

    let response = app.request("GET", "/v1/users/4", None, Some(&token)).await;
    assert_eq!(response.body["memberOf"][0]["name"], "lawyers");

    let plain = app.access_token("mike").await;
    let response = app
        .request("DELETE", &format!("/v1/groups/{gid}"), None, Some(&plain))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
