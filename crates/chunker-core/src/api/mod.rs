//! REST API client module for the Chunker backend.
//!
//! The backend authenticates with a JWT bearer token obtained from its
//! login endpoint; the token is attached by a pre-request hook.

pub mod client;
pub mod error;
pub mod hook;

pub use client::{Access, RequestClient};
pub use error::{ApiError, ErrorKind};
pub use hook::{BearerAuth, RequestHook};
