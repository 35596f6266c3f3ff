//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Cryptographic utilities (random tokens, SHA-256, Base64url, PKCE)
//! - Password hashing (Argon2id with pepper) and password policy checks

pub mod crypto;
pub mod password;
