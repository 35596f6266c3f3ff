//! Typed identifiers for authn entities

use kernel::id::Id;

pub mod markers {
    pub struct User;
    pub struct Principal;
    pub struct Session;
    pub struct Authenticator;
}

pub type UserId = Id<markers::User>;
/// Unique across every principal type
pub type PrincipalId = Id<markers::Principal>;
pub type SessionId = Id<markers::Session>;
pub type AuthenticatorId = Id<markers::Authenticator>;
