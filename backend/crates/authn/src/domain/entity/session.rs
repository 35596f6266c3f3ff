//! Session Entity
//!
//! Created exactly once, when an authentication session finishes. Only the
//! hash of the access token is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::{
    ids::{PrincipalId, SessionId, UserId},
    session_step::SessionCreateReason,
};

/// Random bytes in an access token
pub const ACCESS_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub client_id: String,
    pub user_id: UserId,
    pub principal_id: PrincipalId,
    pub access_token_hash: String,
    pub create_reason: SessionCreateReason,
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
}

impl Session {
    /// New session and its plaintext access token.
    pub fn new(
        client_id: impl Into<String>,
        user_id: UserId,
        principal_id: PrincipalId,
        create_reason: SessionCreateReason,
        now: DateTime<Utc>,
    ) -> (Self, String) {
        let access_token = platform::crypto::random_token(ACCESS_TOKEN_BYTES);
        let session = Self {
            id: SessionId::new(),
            client_id: client_id.into(),
            user_id,
            principal_id,
            access_token_hash: platform::crypto::hash_token(&access_token),
            create_reason,
            created_at: now,
            accessed_at: now,
        };
        (session, access_token)
    }

    pub fn matches_access_token(&self, access_token: &str) -> bool {
        platform::crypto::constant_time_eq(
            platform::crypto::hash_token(access_token).as_bytes(),
            self.access_token_hash.as_bytes(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_hash_is_stored() {
        let (session, token) = Session::new(
            "web",
            UserId::new(),
            PrincipalId::new(),
            SessionCreateReason::Login,
            Utc::now(),
        );
        assert_ne!(session.access_token_hash, token);
        assert!(session.matches_access_token(&token));
        assert!(!session.matches_access_token("guess"));
    }
}
