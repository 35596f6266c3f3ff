//! Login ID value object

use serde::{Deserialize, Serialize};

/// A `(key, value)` pair such as `("email", "user@example.com")`.
///
/// An empty key means "any key" in lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoginId {
    pub key: String,
    pub value: String,
}

impl LoginId {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Key-agnostic lookup form
    pub fn any_key(value: impl Into<String>) -> Self {
        Self::new("", value)
    }

    pub fn matches_key(&self, key: &str) -> bool {
        self.key.is_empty() || self.key == key
    }
}

/// Configured type of a login ID key, used by the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginIdKeyType {
    Email,
    Phone,
    Username,
    /// Accepted verbatim, no standard claim
    Raw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_key() {
        assert!(LoginId::any_key("x").matches_key("email"));
        assert!(LoginId::new("email", "x").matches_key("email"));
        assert!(!LoginId::new("phone", "x").matches_key("email"));
    }
}
