//! Password Principal
//!
//! A login ID (within a realm) bound to a password hash.

use chrono::{DateTime, Utc};
use platform::password::{ClearTextPassword, HashParams, HashedPassword};
use serde_json::{Value, json};

use crate::domain::value_object::{
    claims::{Claims, StandardKey},
    ids::{PrincipalId, UserId},
    login_id::LoginId,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PasswordPrincipal {
    pub id: PrincipalId,
    pub user_id: UserId,
    pub login_id_key: String,
    pub login_id: String,
    pub realm: String,
    pub hashed_password: HashedPassword,
    pub claims: Claims,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PasswordPrincipal {
    /// `standard_key` is what the login ID checker maps the key to; it decides
    /// which claim (if any) the principal publishes.
    pub fn new(
        user_id: UserId,
        login_id: &LoginId,
        realm: impl Into<String>,
        hashed_password: HashedPassword,
        standard_key: Option<StandardKey>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PrincipalId::new(),
            user_id,
            login_id_key: login_id.key.clone(),
            login_id: login_id.value.clone(),
            realm: realm.into(),
            hashed_password,
            claims: derive_claims(&login_id.value, standard_key),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn verify_password(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        self.hashed_password.verify(password, pepper)
    }

    pub fn needs_rehash(&self, current: &HashParams) -> bool {
        self.hashed_password.needs_rehash(current)
    }

    pub fn set_password(&mut self, hashed_password: HashedPassword, now: DateTime<Utc>) {
        self.hashed_password = hashed_password;
        self.updated_at = now;
    }

    pub fn attributes(&self) -> Value {
        json!({
            "login_id_key": self.login_id_key,
            "login_id": self.login_id,
            "realm": self.realm,
        })
    }
}

fn derive_claims(value: &str, standard_key: Option<StandardKey>) -> Claims {
    let mut claims = Claims::new();
    if let Some(key) = standard_key {
        claims.insert(key.claim_name().to_string(), value.to_string());
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed(pw: &str) -> HashedPassword {
        ClearTextPassword::new(pw)
            .hash_with(HashParams::insecure_fast(), None)
            .unwrap()
    }

    #[test]
    fn test_email_key_publishes_email_claim() {
        let p = PasswordPrincipal::new(
            UserId::new(),
            &LoginId::new("email", "a@example.com"),
            "default",
            hashed("secret-pass"),
            Some(StandardKey::Email),
            Utc::now(),
        );
        assert_eq!(p.claims.get("email").map(String::as_str), Some("a@example.com"));
        assert_eq!(p.attributes()["realm"], "default");
    }

    #[test]
    fn test_unmapped_key_has_no_claims() {
        let p = PasswordPrincipal::new(
            UserId::new(),
            &LoginId::new("nickname", "abc"),
            "default",
            hashed("secret-pass"),
            None,
            Utc::now(),
        );
        assert!(p.claims.is_empty());
    }

    #[test]
    fn test_verify_password() {
        let p = PasswordPrincipal::new(
            UserId::new(),
            &LoginId::new("username", "abc"),
            "default",
            hashed("secret-pass"),
            Some(StandardKey::Username),
            Utc::now(),
        );
        assert!(p.verify_password(&ClearTextPassword::new("secret-pass"), None));
        assert!(!p.verify_password(&ClearTextPassword::new("other-pass"), None));
    }
}
