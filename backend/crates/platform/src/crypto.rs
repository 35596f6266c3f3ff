//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Random opaque token: `len` random bytes, base64url without padding.
pub fn random_token(len: usize) -> String {
    to_base64url(&random_bytes(len))
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Storage form of a bearer secret: base64url(SHA-256(token)).
pub fn hash_token(token: &str) -> String {
    to_base64url(&sha256(token.as_bytes()))
}

pub fn to_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn from_base64url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(s)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// PKCE `S256` challenge for a verifier (RFC 7636 §4.2).
pub fn pkce_s256_challenge(verifier: &str) -> String {
    to_base64url(&sha256(verifier.as_bytes()))
}

pub fn verify_pkce_s256(verifier: &str, challenge: &str) -> bool {
    constant_time_eq(
        pkce_s256_challenge(verifier).as_bytes(),
        challenge.as_bytes(),
    )
}
