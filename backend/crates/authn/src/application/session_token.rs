//! Authentication Session Token
//!
//! Stateless continuation token for a pending [`AuthnSession`]:
//! `base64url(claims_json).base64url(HMAC-SHA256(payload))`. The claims carry
//! the session and an expiry; nothing is stored server-side.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use platform::crypto::{from_base64url, to_base64url};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::entity::authn_session::AuthnSession;
use crate::error::{AuthnError, AuthnResult};

#[derive(Serialize, Deserialize)]
struct AuthnSessionClaims {
    authn_session: AuthnSession,
    /// Issued at (Unix ms)
    iat: i64,
    /// Expires at (Unix ms)
    exp: i64,
}

pub struct AuthnSessionTokenCodec {
    secret: [u8; 32],
}

impl AuthnSessionTokenCodec {
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Hmac<Sha256> {
        Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }

    pub fn encode(
        &self,
        session: &AuthnSession,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> AuthnResult<String> {
        let claims = AuthnSessionClaims {
            authn_session: session.clone(),
            iat: now.timestamp_millis(),
            exp: (now + ttl).timestamp_millis(),
        };
        let payload = to_base64url(&serde_json::to_vec(&claims)?);

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!("{}.{}", payload, to_base64url(&signature)))
    }

    /// Any failure (signature, expiry, shape, step invariant) is reported as
    /// `InvalidAuthenticationSession`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> AuthnResult<AuthnSession> {
        let (payload, signature_b64) = token
            .split_once('.')
            .ok_or(AuthnError::InvalidAuthenticationSession)?;

        let signature =
            from_base64url(signature_b64).map_err(|_| AuthnError::InvalidAuthenticationSession)?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthnError::InvalidAuthenticationSession)?;

        let json = from_base64url(payload).map_err(|_| AuthnError::InvalidAuthenticationSession)?;
        let claims: AuthnSessionClaims =
            serde_json::from_slice(&json).map_err(|_| AuthnError::InvalidAuthenticationSession)?;

        if now.timestamp_millis() >= claims.exp {
            return Err(AuthnError::InvalidAuthenticationSession);
        }
        if !claims.authn_session.is_consistent() {
            return Err(AuthnError::InvalidAuthenticationSession);
        }

        Ok(claims.authn_session)
    }
}
