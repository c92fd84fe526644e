//! LDAP bind and search against a listener sharing the API's catalog.

use ldap3::{LdapConnAsync, Scope, SearchEntry};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::helpers::{PASSWORD, TestApp};

const INVALID_CREDENTIALS: u32 = 49;

async fn connect(url: &str) -> ldap3::Ldap {
    let (conn, ldap) = LdapConnAsync::new(url).await.unwrap();
    ldap3::drive!(conn);
    ldap
}

#[tokio::test]
async fn test_bind_and_search_users() {
    let app = TestApp::new().await;
    let directory = app.start_ldap().await;
    let mut ldap = connect(&directory.url).await;

    ldap.simple_bind("uid=saul,ou=Users,dc=example,dc=org", PASSWORD)
        .await
        .unwrap()
        .success()
        .unwrap();

    let (entries, done) = ldap
        .search(
            "ou=Users,dc=example,dc=org",
            Scope::Subtree,
            "(objectClass=*)",
            vec!["uid"],
        )
        .await
        .unwrap()
        .success()
        .unwrap();

    assert_eq!(done.rc, 0);
    let uids: Vec<String> = entries
        .into_iter()
        .map(SearchEntry::construct)
        .map(|entry| entry.attrs["uid"][0].clone())
        .collect();
    assert_eq!(uids, ["saul", "kim", "mike"]);
    ldap.unbind().await.unwrap();
}

#[tokio::test]
async fn test_bind_with_wrong_domain() {
    let app = TestApp::new().await;
    let directory = app.start_ldap().await;
    let mut ldap = connect(&directory.url).await;

    let result = ldap
        .simple_bind("uid=saul,ou=Users,dc=example,dc=com", PASSWORD)
        .await
        .unwrap();
    assert_eq!(result.rc, INVALID_CREDENTIALS);
}

#[tokio::test]
async fn test_filter_selects_single_user() {
    let app = TestApp::new().await;
    let directory = app.start_ldap().await;
    let mut ldap = connect(&directory.url).await;
    ldap.simple_bind("cn=admin,dc=example,dc=org", PASSWORD)
        .await
        .unwrap()
        .success()
        .unwrap();

    let (entries, _) = ldap
        .search(
            "dc=example,dc=org",
            Scope::Subtree,
            "(&(objectClass=inetOrgPerson)(uid=kim))",
            vec!["1.1"],
        )
        .await
        .unwrap()
        .success()
        .unwrap();
    let dns: Vec<String> = entries
        .into_iter()
        .map(|entry| SearchEntry::construct(entry).dn)
        .collect();
    assert_eq!(dns, ["uid=kim,ou=Users,dc=example,dc=org"]);
}

#[tokio::test]
async fn test_password_change_over_http_applies_to_bind() {
    let app = TestApp::new().await;
    let token = app.access_token("admin").await;
    let response = app
        .request(
            "POST",
            "/v1/users/5/passwd",
            Some(serde_json::json!({ "password": "ehrmantraut" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, axum::http::StatusCode::NO_CONTENT);

    let directory = app.start_ldap().await;
    let mut ldap = connect(&directory.url).await;
    let result = ldap
        .simple_bind("uid=mike,ou=Users,dc=example,dc=org", PASSWORD)
        .await
        .unwrap();
    assert_eq!(result.rc, INVALID_CREDENTIALS);
    ldap.simple_bind("uid=mike,ou=Users,dc=example,dc=org", "ehrmantraut")
        .await
        .unwrap()
        .success()
        .unwrap();
}

/// Reads one BER header and returns `(tag, content length)`.
async fn read_header(stream: &mut TcpStream) -> (u8, usize) {
    let tag = stream.read_u8().await.unwrap();
    let first = stream.read_u8().await.unwrap();
    if first < 0x80 {
        return (tag, first as usize);
    }
    let mut len = 0usize;
    for _ in 0..(first & 0x7f) {
        len = (len << 8) | stream.read_u8().await.unwrap() as usize;
    }
    (tag, len)
}

/// Reads one LDAPMessage and returns `(message id, op tag, result code)`.
async fn read_result(stream: &mut TcpStream) -> (u8, u8, u8) {
    let (envelope, _) = read_header(stream).await;
    assert_eq!(envelope, 0x30);
    let (id_tag, id_len) = read_header(stream).await;
    assert_eq!((id_tag, id_len), (0x02, 1));
    let id = stream.read_u8().await.unwrap();
    let (op, op_len) = read_header(stream).await;
    let (code_tag, _) = read_header(stream).await;
    assert_eq!(code_tag, 0x0a);
    let code = stream.read_u8().await.unwrap();

    // matchedDN, diagnostic message and any trailing fields
    let mut rest = vec![0u8; op_len - 3];
    stream.read_exact(&mut rest).await.unwrap();
    (id, op, code)
}

#[tokio::test]
async fn test_malformed_request_keeps_connection() {
    let app = TestApp::new().await;
    let directory = app.start_ldap().await;
    let addr = directory.url.trim_start_matches("ldap://");
    let mut stream = TcpStream::connect(addr).await.unwrap();

    // An envelope carrying only a message id.
    stream.write_all(&[0x30, 0x03, 0x02, 0x01, 0x07]).await.unwrap();
    assert_eq!(read_result(&mut stream).await, (7, 0x78, 2));

    // An abandon request, which the directory does not implement.
    stream
        .write_all(&[0x30, 0x06, 0x02, 0x01, 0x08, 0x50, 0x01, 0x01])
        .await
        .unwrap();
    assert_eq!(read_result(&mut stream).await, (8, 0x78, 53));

    let mut buf = [0u8; 1];
    assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
}
