//! Custom Token Principal
//!
//! A subject asserted by a tenant-signed token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::value_object::ids::{PrincipalId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTokenPrincipal {
    pub id: PrincipalId,
    pub user_id: UserId,
    /// Subject of the custom token
    pub token_principal_id: String,
    pub raw_profile: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomTokenPrincipal {
    pub fn new(
        user_id: UserId,
        token_principal_id: impl Into<String>,
        raw_profile: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PrincipalId::new(),
            user_id,
            token_principal_id: token_principal_id.into(),
            raw_profile,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn attributes(&self) -> Value {
        json!({
            "provider_user_id": self.token_principal_id,
            "raw_profile": self.raw_profile,
        })
    }
}
