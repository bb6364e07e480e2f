//! Authentication state for the client.
//!
//! This module provides:
//! - `TokenStore`: the single persisted bearer token (file, keychain or memory)
//! - `AuthGate`: route guard derived from the token's presence
//! - `Credentials`: the transient username/password pair of a login attempt
//!
//! Authentication is never stored as a flag of its own; it is recomputed
//! from the token every time it is asked for.

pub mod credentials;
pub mod gate;
pub mod token_store;

pub use credentials::{can_add_password_char, can_add_username_char, Credentials};
pub use gate::{guard, AuthGate, Navigation, Route};
pub use token_store::{open_store, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
