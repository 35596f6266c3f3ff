//! Password Hashing and Policy
//!
//! - Argon2id hashing with an optional application-wide pepper
//! - Zeroization of clear text material
//! - Policy checks that report every violated rule at once
//! - Rehash detection for hashes created with outdated parameters

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Minimum password length (NIST: SHALL be at least 8)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (NIST: SHOULD permit at least 64)
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// A single violated password rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password must contain an uppercase letter")]
    UppercaseRequired,

    #[error("Password must contain a lowercase letter")]
    LowercaseRequired,

    #[error("Password must contain a digit")]
    DigitRequired,

    #[error("Password must contain a symbol")]
    SymbolRequired,

    #[error("Password contains a forbidden keyword")]
    ContainsExcludedKeyword,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

impl PasswordPolicyError {
    /// Stable machine-readable name of the violated rule.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "PasswordTooShort",
            Self::TooLong { .. } => "PasswordTooLong",
            Self::EmptyOrWhitespace => "PasswordEmpty",
            Self::InvalidCharacter => "PasswordInvalidCharacter",
            Self::UppercaseRequired => "PasswordUppercaseRequired",
            Self::LowercaseRequired => "PasswordLowercaseRequired",
            Self::DigitRequired => "PasswordDigitRequired",
            Self::SymbolRequired => "PasswordSymbolRequired",
            Self::ContainsExcludedKeyword => "PasswordContainingExcludedKeywords",
            Self::CommonPattern => "PasswordCommonPattern",
        }
    }
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}

// ============================================================================
// Hashing parameters
// ============================================================================

/// Argon2id cost parameters.
///
/// `Default` is the OWASP recommendation (m=19 MiB, t=2, p=1). Hashes whose
/// parameters differ from the configured ones are reported by
/// [`HashedPassword::needs_rehash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
        }
    }
}

impl HashParams {
    /// Minimal cost, for tests and local development only.
    pub fn insecure_fast() -> Self {
        Self {
            m_cost: Params::MIN_M_COST,
            t_cost: 1,
            p_cost: 1,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordHashError> {
        let params = Params::new(self.m_cost, self.t_cost, self.p_cost, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization.
///
/// Unicode is normalized with NFKC on construction so that hashing and policy
/// checks see the same code points. Not `Clone`; debug output is redacted.
///
/// ```rust
/// use platform::password::{ClearTextPassword, HashParams};
///
/// let password = ClearTextPassword::new("correct horse battery staple");
/// let hashed = password.hash_with(HashParams::insecure_fast(), None).unwrap();
/// assert!(hashed.verify(&password, None));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut combined = Zeroizing::new(self.0.as_bytes().to_vec());
        if let Some(p) = pepper {
            combined.extend_from_slice(p);
        }
        combined
    }

    /// Hash with the default (OWASP) parameters.
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        self.hash_with(HashParams::default(), pepper)
    }

    /// Hash with explicit Argon2id parameters. Returns a PHC string wrapper.
    pub fn hash_with(
        &self,
        params: HashParams,
        pepper: Option<&[u8]>,
    ) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(OsRng);
        let hash = params
            .argon2()?
            .hash_password(&self.peppered(pepper), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from storage)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash. Parameters are read from the hash
    /// itself, so hashes created with older parameters still verify.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };

        // Argon2 uses constant-time comparison internally
        Argon2::default()
            .verify_password(&password.peppered(pepper), &parsed_hash)
            .is_ok()
    }

    /// True if the hash is not Argon2id or its parameters differ from `current`.
    pub fn needs_rehash(&self, current: &HashParams) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return true;
        };

        if parsed_hash.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed_hash) {
            Ok(params) => {
                params.m_cost() != current.m_cost
                    || params.t_cost() != current.t_cost
                    || params.p_cost() != current.p_cost
            }
            Err(_) => true,
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Configurable password rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub uppercase_required: bool,
    pub lowercase_required: bool,
    pub digit_required: bool,
    pub symbol_required: bool,
    pub reject_common_patterns: bool,
    /// Case-insensitive substrings that must not appear
    pub excluded_keywords: Vec<String>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            max_length: MAX_PASSWORD_LENGTH,
            uppercase_required: false,
            lowercase_required: false,
            digit_required: false,
            symbol_required: false,
            reject_common_patterns: true,
            excluded_keywords: Vec::new(),
        }
    }
}

impl PasswordPolicy {
    /// Check every rule and return all violations.
    pub fn check(&self, password: &ClearTextPassword) -> Result<(), Vec<PasswordPolicyError>> {
        let value = password.as_str();
        let mut violations = Vec::new();

        if value.trim().is_empty() {
            violations.push(PasswordPolicyError::EmptyOrWhitespace);
        }

        // Code points, not bytes
        let char_count = value.chars().count();
        if char_count < self.min_length {
            violations.push(PasswordPolicyError::TooShort {
                min: self.min_length,
                actual: char_count,
            });
        }
        if char_count > self.max_length {
            violations.push(PasswordPolicyError::TooLong {
                max: self.max_length,
                actual: char_count,
            });
        }

        if value
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            violations.push(PasswordPolicyError::InvalidCharacter);
        }

        if self.uppercase_required && !value.chars().any(char::is_uppercase) {
            violations.push(PasswordPolicyError::UppercaseRequired);
        }
        if self.lowercase_required && !value.chars().any(char::is_lowercase) {
            violations.push(PasswordPolicyError::LowercaseRequired);
        }
        if self.digit_required && !value.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordPolicyError::DigitRequired);
        }
        if self.symbol_required
            && !value
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            violations.push(PasswordPolicyError::SymbolRequired);
        }

        let lower = value.to_lowercase();
        if self
            .excluded_keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
        {
            violations.push(PasswordPolicyError::ContainsExcludedKeyword);
        }

        if self.reject_common_patterns && is_common_pattern(&lower) {
            violations.push(PasswordPolicyError::CommonPattern);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `lower` must already be lowercased.
fn is_common_pattern(lower: &str) -> bool {
    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if lower.chars().count() >= 3 && chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_numbers(lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "abcdefgh",
        "letmein",
        "welcome",
        "admin123",
        "iloveyou",
        "sunshine",
        "trustno1",
    ];
    COMMON_PASSWORDS.contains(&lower)
}

fn is_sequential_numbers(s: &str) -> bool {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 4 {
        return false;
    }

    let is_ascending = digits
        .windows(2)
        .all(|w| w[1] == w[0] + 1 || (w[0] == 9 && w[1] == 0));
    let is_descending = digits
        .windows(2)
        .all(|w| w[0] == w[1] + 1 || (w[0] == 0 && w[1] == 9));

    is_ascending || is_descending
}

// ============================================================================
// Tests
// ============================================================================
