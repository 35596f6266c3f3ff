//! Application Configuration
//!
//! Tenant configuration for the authn application layer. Injected into every
//! use case; nothing here is read from process-wide state.

use std::time::Duration;

use platform::password::{HashParams, PasswordPolicy};
use rand::RngCore;

use crate::domain::value_object::on_user_duplicate::OnUserDuplicate;

/// Which email login IDs receive the welcome email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WelcomeEmailDestination {
    #[default]
    First,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WelcomeEmailConfig {
    pub enabled: bool,
    pub destination: WelcomeEmailDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserVerificationConfig {
    pub auto_send_on_signup: bool,
    /// Login ID keys that get a verification code on signup
    pub login_id_keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MfaEnforcement {
    #[default]
    Off,
    /// Required only for users who enrolled an authenticator
    Optional,
    /// Required for everyone; users without one must enroll
    Required,
}

/// Authn application configuration
#[derive(Debug, Clone)]
pub struct AuthnConfig {
    /// Realm of password principals created by signup and used at login
    pub default_realm: String,
    pub on_user_duplicate_allow_merge: bool,
    pub on_user_duplicate_allow_create: bool,
    pub welcome_email: WelcomeEmailConfig,
    pub user_verification: UserVerificationConfig,
    pub mfa_enforcement: MfaEnforcement,
    /// HMAC key for authentication session tokens (32 bytes)
    pub authn_session_secret: [u8; 32],
    /// Lifetime of a pending authentication session token (5 minutes)
    pub authn_session_ttl: Duration,
    /// Lifetime of an OAuth authorization code (5 minutes)
    pub authorization_code_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Argon2id cost; older hashes are upgraded on login
    pub password_hash_params: HashParams,
    pub password_policy: PasswordPolicy,
}

impl Default for AuthnConfig {
    fn default() -> Self {
        Self {
            default_realm: "default".to_string(),
            on_user_duplicate_allow_merge: false,
            on_user_duplicate_allow_create: false,
            welcome_email: WelcomeEmailConfig::default(),
            user_verification: UserVerificationConfig::default(),
            mfa_enforcement: MfaEnforcement::Off,
            authn_session_secret: [0u8; 32],
            authn_session_ttl: Duration::from_secs(5 * 60),
            authorization_code_ttl: Duration::from_secs(5 * 60),
            password_pepper: None,
            password_hash_params: HashParams::default(),
            password_policy: PasswordPolicy::default(),
        }
    }
}

impl AuthnConfig {
    /// Create config with a random session secret
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            authn_session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (cheap password hashing)
    pub fn development() -> Self {
        Self {
            password_hash_params: HashParams::insecure_fast(),
            ..Self::with_random_secret()
        }
    }

    pub fn is_on_user_duplicate_allowed(&self, value: OnUserDuplicate) -> bool {
        value.is_allowed(
            self.on_user_duplicate_allow_merge,
            self.on_user_duplicate_allow_create,
        )
    }

    /// Get authn session TTL in milliseconds
    pub fn authn_session_ttl_ms(&self) -> i64 {
        self.authn_session_ttl.as_millis() as i64
    }

    /// Get authorization code TTL in milliseconds
    pub fn authorization_code_ttl_ms(&self) -> i64 {
        self.authorization_code_ttl.as_millis() as i64
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
