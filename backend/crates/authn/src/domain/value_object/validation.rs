//! Structured validation causes
//!
//! A cause names what is wrong (`kind`) and where (`pointer`, a JSON pointer
//! into the request body).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCause {
    pub kind: String,
    pub pointer: String,
    pub message: String,
}

impl ValidationCause {
    pub fn new(
        kind: impl Into<String>,
        pointer: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    pub fn required(pointer: impl Into<String>) -> Self {
        Self::new("Required", pointer, "value is required")
    }

    pub fn duplicated(pointer: impl Into<String>) -> Self {
        Self::new("Duplicated", pointer, "duplicated value")
    }

    pub fn not_allowed(pointer: impl Into<String>) -> Self {
        Self::new("NotAllowed", pointer, "value is not allowed")
    }

    pub fn invalid_format(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new("StringFormat", pointer, message)
    }

    /// Re-root the pointer under `prefix`, e.g. `/0/value` -> `/login_ids/0/value`.
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.pointer = format!("{}{}", prefix, self.pointer);
        self
    }
}

impl From<platform::password::PasswordPolicyError> for ValidationCause {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        Self::new(err.kind(), "/password", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed() {
        let cause = ValidationCause::invalid_format("/0/value", "invalid email").prefixed("/login_ids");
        assert_eq!(cause.pointer, "/login_ids/0/value");
        assert_eq!(cause.kind, "StringFormat");
    }

    #[test]
    fn test_from_password_policy_error() {
        let cause: ValidationCause = platform::password::PasswordPolicyError::DigitRequired.into();
        assert_eq!(cause.kind, "PasswordDigitRequired");
        assert_eq!(cause.pointer, "/password");
    }
}
