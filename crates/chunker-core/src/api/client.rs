//! API client for the Chunker backend.
//!
//! `RequestClient` is built once from the configuration. Every request goes
//! through the registered [`RequestHook`] before it is sent; the default hook
//! attaches the stored bearer token.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{header, multipart, Client, Method, Request, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, warn};
use url::Url;

use super::hook::{BearerAuth, RequestHook};
use super::ApiError;
use crate::auth::{Credentials, TokenStore};
use crate::config::Config;
use crate::models::{Chunk, ChunkRequest, StoredFile, UploadReceipt, UploadableFile};

// ============================================================================
// Endpoints
// ============================================================================

const LOGIN_PATH: &str = "auth/login";
const UPLOAD_PATH: &str = "upload/";
const FILES_PATH: &str = "upload/files";
const CHUNKING_PATH: &str = "chunking/process";

/// Multipart field the upload endpoint reads the file from
const UPLOAD_FIELD: &str = "file";

/// Whether a request needs a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// A 401 on a protected call means the stored token is dead
    Protected,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Shared HTTP client for the backend.
/// Clone is cheap - reqwest::Client and the store are reference counted.
#[derive(Clone)]
pub struct RequestClient {
    client: Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
    hook: Arc<dyn RequestHook>,
}

impl RequestClient {
    /// Build the client. Fails when the backend URL is not configured.
    pub fn new(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let base_url = config.backend_url()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        debug!(base_url = %base_url, "Request client configured");
        let hook = Arc::new(BearerAuth::new(store.clone()));
        Ok(Self {
            client,
            base_url,
            store,
            hook,
        })
    }

    /// Replace the pre-request hook.
    pub fn with_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Store a token; it is attached from the next request on.
    pub fn set_token(&self, token: &str) -> Result<(), ApiError> {
        self.store.set_token(token).map_err(ApiError::Storage)
    }

    /// Forget the token; the next request goes out without credentials.
    pub fn clear_token(&self) -> Result<(), ApiError> {
        self.store.clear_token().map_err(ApiError::Storage)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidResponse(format!("Bad endpoint {}: {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .request(method, self.endpoint(path)?)
            .header(header::ACCEPT, "application/json"))
    }

    /// Run the hook, send, and turn non-2xx answers into errors.
    async fn send(&self, builder: RequestBuilder, access: Access) -> Result<Response, ApiError> {
        let mut request: Request = builder.build()?;
        self.hook.before_request(&mut request)?;

        let carried_token = request.headers().contains_key(header::AUTHORIZATION);
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, path = %path, authenticated = carried_token, "Sending request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%method, path = %path, status = status.as_u16(), "Request failed");

        if status == StatusCode::UNAUTHORIZED && access == Access::Protected && carried_token {
            warn!(path = %path, "Session rejected by backend, clearing stored token");
            if let Err(e) = self.store.clear_token() {
                warn!(error = %e, "Failed to clear rejected token");
            }
        }

        Err(ApiError::from_status(status, &body))
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().path().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))
    }

    // ===== Endpoints =====

    /// Exchange credentials for a bearer token. Does not store it.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let builder = self.request(Method::POST, LOGIN_PATH)?.json(credentials);
        let response = self.send(builder, Access::Public).await?;
        let login: LoginResponse = Self::parse_json(response).await?;

        if login.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "Login response carried an empty token".to_string(),
            ));
        }
        info!(username = %credentials.username, "Authenticated");
        Ok(login.token)
    }

    /// Upload one file as a multipart form.
    pub async fn upload(&self, file: &UploadableFile) -> Result<UploadReceipt, ApiError> {
        let mut part = multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        if !file.media_type.trim().is_empty() {
            part = part.mime_str(file.media_type.trim())?;
        }
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let builder = self.request(Method::POST, UPLOAD_PATH)?.multipart(form);
        let response = self.send(builder, Access::Protected).await?;

        // Any 2xx counts; the body is informational
        let text = response.text().await.unwrap_or_default();
        let receipt = serde_json::from_str(&text).unwrap_or_else(|_| {
            debug!("Upload acknowledged without a structured body");
            UploadReceipt::default()
        });
        info!(file = %file.name, size = file.size(), "File uploaded");
        Ok(receipt)
    }

    /// List files the backend has stored.
    pub async fn list_files(&self) -> Result<Vec<StoredFile>, ApiError> {
        let builder = self.request(Method::GET, FILES_PATH)?;
        let response = self.send(builder, Access::Protected).await?;
        Self::parse_json(response).await
    }

    /// Ask the backend to split a markdown document into chunks.
    pub async fn process_chunks(
        &self,
        content: &str,
        filename: &str,
    ) -> Result<Vec<Chunk>, ApiError> {
        let body = ChunkRequest { content, filename };
        let builder = self.request(Method::POST, CHUNKING_PATH)?.json(&body);
        let response = self.send(builder, Access::Protected).await?;
        let chunks: Vec<Chunk> = Self::parse_json(response).await?;
        debug!(count = chunks.len(), file = filename, "Chunks received");
        Ok(chunks)
    }
}
