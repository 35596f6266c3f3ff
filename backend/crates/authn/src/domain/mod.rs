//! Domain Layer
//!
//! Entities, value objects, repository traits and the ports the core consumes.

pub mod entity;
pub mod repository;
pub mod services;
pub mod sso;
pub mod value_object;

// Re-exports
pub use entity::{
    authn_session::AuthnSession,
    identity::Identity,
    principal::{Principal, PrincipalInfo},
    user::User,
};
pub use repository::AuthnStore;
pub use services::{HookDispatcher, PrincipalProvider, TaskQueue, TimeProvider};
