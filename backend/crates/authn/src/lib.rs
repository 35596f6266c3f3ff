//! Authn (Authentication) Core
//!
//! Clean Architecture structure:
//! - `domain/` - Principals, users, sessions, repository traits and ports
//! - `application/` - Authenticate, signup, OAuth and session use cases
//! - `infra/` - In-memory store and default checkers
//!
//! ## Features
//! - Password login by login ID (email, phone, username) within a realm
//! - Federated (OAuth) login, signup, merge and link
//! - Anonymous and custom token principals
//! - Multi-step authentication sessions with optional or required MFA
//!
//! ## Security Model
//! - Passwords hashed with Argon2id; outdated hashes upgraded on login
//! - Pending authentication sessions carried as HMAC-signed, expiring tokens
//! - Authorization codes are single use, stored hashed, with optional PKCE (S256)
//! - Access tokens are stored hashed only

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthnConfig;
pub use error::{AuthnError, AuthnResult};
pub use infra::memory::InMemoryStore;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}
