//! Default Login ID Checker
//!
//! Format rules per configured key type, plus a per-key limit on how many
//! login IDs one signup may carry.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::domain::services::LoginIdChecker;
use crate::domain::value_object::{
    claims::StandardKey,
    email::Email,
    login_id::{LoginId, LoginIdKeyType},
    validation::ValidationCause,
};

/// Maximum username length (code points)
const USERNAME_MAX_LENGTH: usize = 40;

/// One accepted login ID key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginIdKeyConfig {
    pub key: String,
    pub key_type: LoginIdKeyType,
    /// Maximum number of login IDs with this key per user
    pub maximum: usize,
}

impl LoginIdKeyConfig {
    pub fn new(key: impl Into<String>, key_type: LoginIdKeyType, maximum: usize) -> Self {
        Self {
            key: key.into(),
            key_type,
            maximum,
        }
    }
}

pub struct DefaultLoginIdChecker {
    keys: Vec<LoginIdKeyConfig>,
}

impl Default for DefaultLoginIdChecker {
    /// `email`, `phone` and `username`, one of each.
    fn default() -> Self {
        Self::new(vec![
            LoginIdKeyConfig::new("email", LoginIdKeyType::Email, 1),
            LoginIdKeyConfig::new("phone", LoginIdKeyType::Phone, 1),
            LoginIdKeyConfig::new("username", LoginIdKeyType::Username, 1),
        ])
    }
}

impl DefaultLoginIdChecker {
    pub fn new(keys: Vec<LoginIdKeyConfig>) -> Self {
        Self { keys }
    }

    fn key_config(&self, key: &str) -> Option<&LoginIdKeyConfig> {
        self.keys.iter().find(|k| k.key == key)
    }

    fn check_format(key_type: LoginIdKeyType, value: &str) -> Result<(), String> {
        match key_type {
            LoginIdKeyType::Email => Email::new(value)
                .map(|_| ())
                .map_err(|e| e.message().to_string()),
            LoginIdKeyType::Phone => {
                let digits = value.strip_prefix('+').ok_or("phone must start with +")?;
                if (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
                    Ok(())
                } else {
                    Err("invalid phone number".to_string())
                }
            }
            LoginIdKeyType::Username => {
                let length = value.chars().count();
                if length > USERNAME_MAX_LENGTH {
                    return Err(format!(
                        "username must be at most {} characters",
                        USERNAME_MAX_LENGTH
                    ));
                }
                if value
                    .chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
                {
                    Ok(())
                } else {
                    Err("username contains invalid characters".to_string())
                }
            }
            LoginIdKeyType::Raw => Ok(()),
        }
    }
}

impl LoginIdChecker for DefaultLoginIdChecker {
    fn validate(&self, login_ids: &[LoginId]) -> Vec<ValidationCause> {
        let mut causes = Vec::new();
        if login_ids.is_empty() {
            causes.push(ValidationCause::required(""));
            return causes;
        }

        let mut amounts: HashMap<&str, usize> = HashMap::new();
        for (i, login_id) in login_ids.iter().enumerate() {
            let Some(config) = self.key_config(&login_id.key) else {
                causes.push(ValidationCause::not_allowed(format!("/{}/key", i)));
                continue;
            };
            *amounts.entry(config.key.as_str()).or_default() += 1;

            if login_id.value.is_empty() {
                causes.push(ValidationCause::required(format!("/{}/value", i)));
                continue;
            }
            if let Err(message) = Self::check_format(config.key_type, &login_id.value) {
                causes.push(ValidationCause::invalid_format(format!("/{}/value", i), message));
            }
        }

        for config in &self.keys {
            let amount = amounts.get(config.key.as_str()).copied().unwrap_or(0);
            if amount > config.maximum {
                causes.push(ValidationCause::new(
                    "EntryAmount",
                    "",
                    format!("at most {} login IDs with key {}", config.maximum, config.key),
                ));
            }
        }

        causes
    }

    fn standard_key(&self, key: &str) -> Option<StandardKey> {
        match self.key_config(key)?.key_type {
            LoginIdKeyType::Email => Some(StandardKey::Email),
            LoginIdKeyType::Phone => Some(StandardKey::Phone),
            LoginIdKeyType::Username => Some(StandardKey::Username),
            LoginIdKeyType::Raw => None,
        }
    }

    fn normalize(&self, login_id: &LoginId) -> LoginId {
        let value = login_id.value.trim();
        let value = match self.key_config(&login_id.key).map(|k| k.key_type) {
            Some(LoginIdKeyType::Email) => value.to_lowercase(),
            Some(LoginIdKeyType::Username) => value.nfkc().collect::<String>().to_lowercase(),
            Some(LoginIdKeyType::Phone) => value.chars().filter(|c| !c.is_whitespace()).collect(),
            Some(LoginIdKeyType::Raw) | None => value.to_string(),
        };
        LoginId::new(login_id.key.clone(), value)
    }

    fn lookup_candidates(&self, login_id: &LoginId) -> Vec<LoginId> {
        if !login_id.key.is_empty() {
            return vec![self.normalize(login_id)];
        }
        let mut candidates: Vec<LoginId> = self
            .keys
            .iter()
            .map(|k| self.normalize(&LoginId::new(k.key.clone(), login_id.value.clone())))
            .collect();
        candidates.push(self.normalize(login_id));
        candidates
    }
}
