//! Core library for the Chunker client.
//!
//! Session handling, token storage, the backend API client and the upload
//! flow live here; front ends only render the state these produce.
//!
//! ```text
//! SessionFlow ──writes──▶ TokenStore ◀──reads── AuthGate
//!                             ▲
//!                           reads (every request)
//!                             │
//! UploadFlow ──uses──▶ RequestClient
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod flows;
pub mod models;

pub use api::{ApiError, RequestClient};
pub use auth::{AuthGate, Credentials, Navigation, Route, TokenStore};
pub use config::{Config, ConfigError};
pub use flows::{FlowError, SessionFlow, SessionState, UploadFlow, UploadStatus, ValidationError};
pub use models::UploadableFile;
