//! Hook Events
//!
//! Dispatched synchronously; a hook may rewrite the user it is given or reject
//! the event, which aborts the operation.

use serde::Serialize;

use crate::domain::entity::identity::Identity;
use crate::domain::value_object::{ids::SessionId, session_step::SessionCreateReason};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum AuthEvent {
    #[serde(rename = "user.create")]
    UserCreate { identities: Vec<Identity> },
    #[serde(rename = "identity.create")]
    IdentityCreate { identity: Identity },
    #[serde(rename = "session.create")]
    SessionCreate {
        identity: Identity,
        session_id: SessionId,
        reason: SessionCreateReason,
    },
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::UserCreate { .. } => "user.create",
            AuthEvent::IdentityCreate { .. } => "identity.create",
            AuthEvent::SessionCreate { .. } => "session.create",
        }
    }
}
