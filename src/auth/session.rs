//! Session tokens
//!
//! Identity travels as an HMAC-signed token (in a cookie or a Bearer
//! header); there is no server-side session table. Token format:
//! `base64url(json payload) . base64url(hmac-sha256(payload))`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// User session data
///
/// Guest sessions carry no user id and never touch the database; they
/// are replaced outright by the next real authentication event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Auth user id; None for guest sessions
    pub user_id: Option<String>,
    /// Account email; None for guest sessions
    pub email: Option<String>,
    /// Explicit "continue without an account" mode
    pub guest: bool,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Session for a signed-in user
    pub fn for_user(user_id: String, email: String, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: Some(user_id),
            email: Some(email),
            guest: false,
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Guest pseudo-session (no account, no store access)
    pub fn guest(max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: None,
            email: None,
            guest: true,
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

fn mac_for(secret: &str, payload_b64: &str) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    Ok(mac)
}

/// Sign a session into its token form.
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let signature = mac_for(secret, &payload_b64)?.finalize().into_bytes();
    let signature_b64 = URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify a token and decode the session it carries.
///
/// Rejects malformed tokens, bad signatures, and expired sessions.
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let Some((payload_b64, signature_b64)) = token.split_once('.') else {
        return Err(AppError::Unauthorized);
    };
    if signature_b64.contains('.') {
        return Err(AppError::Unauthorized);
    }

    let claimed_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;
    mac_for(secret, payload_b64)?
        .verify_slice(&claimed_signature)
        .map_err(|_| AppError::InvalidSignature)?;

    // The payload is only parsed once the signature checks out.
    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;
    let session: Session =
        serde_json::from_slice(&payload).map_err(|_| AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-32-bytes-long!!!";

    #[test]
    fn user_token_round_trips() {
        let session = Session::for_user("user-1".to_string(), "a@example.com".to_string(), 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let verified = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(verified.user_id.as_deref(), Some("user-1"));
        assert!(!verified.guest);
    }

    #[test]
    fn guest_token_round_trips() {
        let session = Session::guest(3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let verified = verify_session_token(&token, SECRET).unwrap();
        assert!(verified.guest);
        assert!(verified.user_id.is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let session = Session::for_user("user-1".to_string(), "a@example.com".to_string(), 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(verify_session_token(&tampered, SECRET).is_err());
        assert!(verify_session_token(&token, "another-secret-32-bytes-long!!!!").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let session = Session {
            user_id: Some("user-1".to_string()),
            email: Some("a@example.com".to_string()),
            guest: false,
            created_at: Utc::now() - Duration::hours(2),
            expires_at: Utc::now() - Duration::hours(1),
        };
        let token = create_session_token(&session, SECRET).unwrap();
        assert!(verify_session_token(&token, SECRET).is_err());
    }
}
