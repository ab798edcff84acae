//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{AppError, SessionDecodeError};

/// Name of the cookie carrying the signed session
pub const SESSION_COOKIE_NAME: &str = "session";

type HmacSha256 = Hmac<Sha256>;

/// User session data
///
/// Stored in a signed cookie. Every field has a default so cookies
/// written before a field existed still decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Whether the holder completed the OAuth flow
    #[serde(default)]
    pub authenticated: bool,
    /// GitHub login of the principal
    #[serde(default)]
    pub principal_name: String,
    /// When session was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    /// When session expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Check if session is expired
    ///
    /// Sessions without an expiry are bounded by the cookie's Max-Age.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < Utc::now())
    }
}

/// Signs sessions into cookie values and verifies them back.
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
#[derive(Clone)]
pub struct SessionCodec {
    secret: Vec<u8>,
    max_age: Duration,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    /// Create a codec
    ///
    /// # Arguments
    /// * `secret` - HMAC secret key
    /// * `max_age_seconds` - Lifetime of issued sessions
    pub fn new(secret: impl Into<Vec<u8>>, max_age_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            max_age: Duration::seconds(max_age_seconds),
        }
    }

    /// Create a codec with a freshly generated random secret
    pub fn with_random_secret(max_age_seconds: i64) -> Self {
        let mut secret = vec![0_u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(secret, max_age_seconds)
    }

    /// Lifetime of issued sessions
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Build an authenticated session for `principal_name`
    pub fn issue(&self, principal_name: impl Into<String>) -> Session {
        let now = Utc::now();
        Session {
            authenticated: true,
            principal_name: principal_name.into(),
            issued_at: Some(now),
            expires_at: Some(now + self.max_age),
        }
    }

    /// Create a signed session token
    ///
    /// # Returns
    /// Signed token string
    pub fn encode(&self, session: &Session) -> Result<String, AppError> {
        // 1. Serialize session to JSON
        let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;

        // 2. Base64 encode the payload
        let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

        // 3. Create HMAC-SHA256 signature
        let mut mac = self.mac()?;
        mac.update(payload_b64.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        // 4. Return "{payload}.{signature}"
        Ok(format!("{}.{}", payload_b64, signature_b64))
    }

    /// Verify and decode a session token
    ///
    /// Returns `None` for anything that is not a valid, unexpired token
    /// signed with this codec's secret. Never fails the request.
    pub fn decode(&self, token: &str) -> Option<Session> {
        match self.verify(token) {
            Ok(session) => Some(session),
            Err(reason) => {
                tracing::debug!(%reason, "Ignoring session cookie");
                None
            }
        }
    }

    /// Read and decode the session cookie from a jar
    pub fn from_jar(&self, jar: &CookieJar) -> Option<Session> {
        jar.get(SESSION_COOKIE_NAME)
            .and_then(|cookie| self.decode(cookie.value()))
    }

    /// Build the session cookie carrying `value`
    pub fn session_cookie(&self, value: String, secure: bool) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, value))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.max_age.num_seconds()))
            .build()
    }

    /// Build the removal cookie for the session
    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
            .path("/")
            .http_only(true)
            .build();
        cookie.make_removal();
        cookie
    }

    /// Compare two tokens in constant time by checking their MACs
    pub fn tokens_match(&self, expected: &str, candidate: &str) -> bool {
        let (Ok(mut expected_mac), Ok(mut candidate_mac)) = (self.mac(), self.mac()) else {
            return false;
        };
        expected_mac.update(expected.as_bytes());
        candidate_mac.update(candidate.as_bytes());
        let candidate_tag = candidate_mac.finalize().into_bytes();
        expected_mac.verify_slice(&candidate_tag).is_ok()
    }

    fn mac(&self) -> Result<HmacSha256, AppError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AppError::Encryption(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<Session, SessionDecodeError> {
        // 1. Split token into payload and signature
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or(SessionDecodeError::Malformed)?;
        if signature_b64.contains('.') {
            return Err(SessionDecodeError::Malformed);
        }

        // 2. Verify HMAC signature
        let mut mac = self.mac().map_err(|_| SessionDecodeError::InvalidSignature)?;
        mac.update(payload_b64.as_bytes());

        let signature = general_purpose::URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| SessionDecodeError::Malformed)?;

        mac.verify_slice(&signature)
            .map_err(|_| SessionDecodeError::InvalidSignature)?;

        // 3. Decode and deserialize payload
        let payload_bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| SessionDecodeError::InvalidPayload)?;

        let session: Session = serde_json::from_slice(&payload_bytes)
            .map_err(|_| SessionDecodeError::InvalidPayload)?;

        // 4. Check if session is expired
        if session.is_expired() {
            return Err(SessionDecodeError::Expired);
        }

        Ok(session)
    }
}
