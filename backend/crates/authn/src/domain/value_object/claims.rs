//! Standardized claims
//!
//! Principals expose identity facts (currently only the email address) under
//! provider-independent names so duplicates can be detected across types.

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

pub type Claims = BTreeMap<String, String>;

/// Standard claim a login ID key can map to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardKey {
    #[display("email")]
    Email,
    #[display("phone")]
    Phone,
    #[display("username")]
    Username,
}

impl StandardKey {
    /// Claim name under which values of this key are published.
    #[inline]
    pub const fn claim_name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Username => "username",
        }
    }
}

/// Email claim, if present and non-empty.
pub fn email_claim(claims: &Claims) -> Option<&str> {
    claims
        .get(StandardKey::Email.claim_name())
        .map(String::as_str)
        .filter(|s| !s.is_empty())
}
