//! Authenticator Entity
//!
//! Second-factor enrollment. The core only needs to know whether a user has
//! any; enrollment and verification live with the MFA service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::ids::{AuthenticatorId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticatorKind {
    Totp,
    Oob,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticator {
    pub id: AuthenticatorId,
    pub user_id: UserId,
    pub kind: AuthenticatorKind,
    pub created_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(user_id: UserId, kind: AuthenticatorKind, now: DateTime<Utc>) -> Self {
        Self {
            id: AuthenticatorId::new(),
            user_id,
            kind,
            created_at: now,
        }
    }
}
