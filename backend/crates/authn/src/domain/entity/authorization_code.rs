//! Authorization Code Entity
//!
//! Single-use code handed to the client after a federated login or link.
//! Keyed by the hash of the plaintext code.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::{
    ids::{PrincipalId, UserId},
    session_step::SessionCreateReason,
};

/// Random bytes in a plaintext code
pub const CODE_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeAction {
    Login,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub code_hash: String,
    pub action: CodeAction,
    /// PKCE S256 challenge, when the client sent one
    pub code_challenge: Option<String>,
    pub user_id: UserId,
    pub principal_id: PrincipalId,
    /// Set for `login` codes
    pub session_create_reason: Option<SessionCreateReason>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthorizationCode {
    /// New code record and its plaintext code.
    pub fn issue(
        action: CodeAction,
        code_challenge: Option<String>,
        user_id: UserId,
        principal_id: PrincipalId,
        session_create_reason: Option<SessionCreateReason>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> (Self, String) {
        let code = platform::crypto::random_token(CODE_BYTES);
        let record = Self {
            code_hash: platform::crypto::hash_token(&code),
            action,
            code_challenge: code_challenge.filter(|c| !c.is_empty()),
            user_id,
            principal_id,
            session_create_reason,
            created_at: now,
            expires_at: now + ttl,
        };
        (record, code)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
