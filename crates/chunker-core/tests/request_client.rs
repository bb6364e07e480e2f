//! Integration tests for token attachment and the auxiliary endpoints.

mod common;

use std::sync::Arc;

use chunker_core::api::{ApiError, RequestHook};
use chunker_core::TokenStore;
use common::{authorization_headers, client};
use reqwest::header::HeaderValue;
use reqwest::Request;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_files(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/upload/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"filename": "guide.md", "size": 2048, "created_at": 1700000000.0}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_token_attached_until_cleared() {
    let server = MockServer::start().await;
    mount_files(&server).await;
    let (client, store) = client(&server, None);

    client.list_files().await.unwrap();

    client.set_token("T1").unwrap();
    client.list_files().await.unwrap();
    client.list_files().await.unwrap();

    client.set_token("T2").unwrap();
    client.list_files().await.unwrap();

    client.clear_token().unwrap();
    client.clear_token().unwrap();
    client.list_files().await.unwrap();

    assert_eq!(store.get_token().unwrap(), None);
    assert_eq!(
        authorization_headers(&server).await,
        vec![
            None,
            Some("Bearer T1".to_string()),
            Some("Bearer T1".to_string()),
            Some("Bearer T2".to_string()),
            None,
        ]
    );
}

#[tokio::test]
async fn test_list_files() {
    let server = MockServer::start().await;
    mount_files(&server).await;
    let (client, _) = client(&server, Some("fake-token"));

    let files = client.list_files().await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "guide.md");
    assert_eq!(files[0].size, 2048);
    assert_eq!(files[0].created().unwrap().timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_process_chunks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chunking/process"))
        .and(header("authorization", "Bearer fake-token"))
        .and(body_json(json!({"content": "## A\nalpha\n## B\nbeta", "filename": "doc.md"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "doc.md_001", "content": "## A\nalpha\n", "title": "A", "size": 11, "index": 0,
             "metadata": {"filename": "doc.md", "datetime": "2024-05-01 10:00:00", "title": "A"}},
            {"id": "doc.md_002", "content": "## B\nbeta", "title": "B", "size": 9, "index": 1,
             "metadata": {"filename": "doc.md", "datetime": "2024-05-01 10:00:00", "title": "B"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let (client, _) = client(&server, Some("fake-token"));

    let chunks = client
        .process_chunks("## A\nalpha\n## B\nbeta", "doc.md")
        .await
        .unwrap();

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].id, "doc.md_002");
    assert_eq!(chunks[1].title, "B");
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/upload/files"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let (client, store) = client(&server, Some("fake-token"));

    let err = client.list_files().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
    assert_eq!(store.get_token().unwrap().as_deref(), Some("fake-token"));
}

#[tokio::test]
async fn test_protected_401_clears_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/upload/files"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let (client, store) = client(&server, Some("dead-token"));

    let err = client.list_files().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(store.get_token().unwrap(), None);
}

#[tokio::test]
async fn test_other_errors_keep_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/upload/files"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let (client, store) = client(&server, Some("fake-token"));

    let err = client.list_files().await.unwrap_err();

    assert!(matches!(err, ApiError::AccessDenied { .. }));
    assert_eq!(store.get_token().unwrap().as_deref(), Some("fake-token"));
}

struct Tagging;

impl RequestHook for Tagging {
    fn before_request(&self, request: &mut Request) -> Result<(), ApiError> {
        request
            .headers_mut()
            .insert("x-client", HeaderValue::from_static("chunker-tests"));
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_hook_runs_on_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/upload/files"))
        .and(header("x-client", "chunker-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    let (client, _) = client(&server, Some("fake-token"));
    let client = Arc::unwrap_or_clone(client).with_hook(Arc::new(Tagging));

    assert!(client.list_files().await.unwrap().is_empty());
    assert!(client.list_files().await.unwrap().is_empty());
    // The replacement hook does not attach credentials
    assert_eq!(authorization_headers(&server).await, vec![None, None]);
}
