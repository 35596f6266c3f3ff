//! User Entities
//!
//! The core reads and writes two records per user: the account (auth info) and
//! the free-form profile. Hooks and results see both through [`User`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::value_object::ids::UserId;

/// Auth info of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub disabled: bool,
    pub verified: bool,
}

impl UserAccount {
    /// New account. Signup counts as the first login.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            created_at: now,
            updated_at: now,
            last_login_at: Some(now),
            last_seen_at: None,
            disabled: false,
            verified: false,
        }
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.last_seen_at = Some(now);
        self.updated_at = now;
    }
}

/// Free-form user metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: UserId, metadata: Map<String, Value>, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Account and profile presented together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub account: UserAccount,
    pub profile: UserProfile,
}

impl User {
    pub fn new(account: UserAccount, profile: UserProfile) -> Self {
        Self { account, profile }
    }

    pub fn id(&self) -> UserId {
        self.account.id
    }
}
