//! Anonymous Principal
//!
//! A device key bound to a user that has not registered a login ID yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::value_object::ids::{PrincipalId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousPrincipal {
    pub id: PrincipalId,
    pub user_id: UserId,
    pub key_id: String,
    pub created_at: DateTime<Utc>,
}

impl AnonymousPrincipal {
    pub fn new(user_id: UserId, key_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: PrincipalId::new(),
            user_id,
            key_id: key_id.into(),
            created_at: now,
        }
    }

    pub fn attributes(&self) -> Value {
        json!({ "key_id": self.key_id })
    }
}
