//! Shared fixtures for integration tests against a mock backend.

#![allow(dead_code)]

use std::sync::Arc;

use chunker_core::auth::MemoryTokenStore;
use chunker_core::{Config, RequestClient, TokenStore};
use wiremock::MockServer;

pub fn config_for(server: &MockServer) -> Config {
    Config {
        backend_url: Some(server.uri()),
        ..Default::default()
    }
}

pub fn client_with_store(server: &MockServer, store: Arc<dyn TokenStore>) -> Arc<RequestClient> {
    Arc::new(RequestClient::new(&config_for(server), store).unwrap())
}

/// Client over an in-memory store, optionally pre-loaded with a token.
pub fn client(
    server: &MockServer,
    token: Option<&str>,
) -> (Arc<RequestClient>, Arc<MemoryTokenStore>) {
    let store = Arc::new(match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::default(),
    });
    (client_with_store(server, store.clone()), store)
}

/// Client aimed at a local port that refuses connections.
pub fn refused_client() -> (Arc<RequestClient>, Arc<MemoryTokenStore>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config {
        backend_url: Some(format!("http://{}", addr)),
        ..Default::default()
    };
    let store = Arc::new(MemoryTokenStore::default());
    let client = RequestClient::new(&config, store.clone()).unwrap();
    (Arc::new(client), store)
}

/// `Authorization` header values of every request the server has seen.
pub async fn authorization_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|req| {
            req.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}
