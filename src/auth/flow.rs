//! Login flow
//!
//! ```text
//! Anonymous ──start_login──▶ PendingProviderCallback ──complete_login──▶ Authenticated
//!     ▲                              │ state mismatch / provider failure        │
//!     └──────────────────────────────┴────────────────── logout ◀───────────────┘
//! ```
//!
//! Pure orchestration over the identity provider and the session codec.
//! The HTTP handlers in `oauth` move the state token and the session
//! in and out of cookies.

use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;

use super::session::{Session, SessionCodec};
use crate::error::{LoginError, ProviderError};
use crate::provider::IdentityProvider;

/// Where a client is in the login lifecycle, as seen from its cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    PendingProviderCallback,
    Authenticated,
}

impl AuthState {
    /// Derive the state from a decoded session and whether a login
    /// attempt's state token is outstanding
    pub fn of(session: Option<&Session>, pending_login: bool) -> Self {
        match session {
            Some(session) if session.authenticated => AuthState::Authenticated,
            _ if pending_login => AuthState::PendingProviderCallback,
            _ => AuthState::Anonymous,
        }
    }
}

/// Where to send the browser to start a login, and the token that
/// must come back on the callback
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub url: String,
    pub state_token: String,
}

/// Drives one login attempt
pub struct LoginFlow<'a> {
    provider: &'a dyn IdentityProvider,
    codec: &'a SessionCodec,
}

impl<'a> LoginFlow<'a> {
    pub fn new(provider: &'a dyn IdentityProvider, codec: &'a SessionCodec) -> Self {
        Self { provider, codec }
    }

    /// Anonymous → PendingProviderCallback
    ///
    /// Generates a fresh anti-forgery token for this attempt. No session
    /// is created.
    pub fn start_login(&self) -> LoginRedirect {
        let state_token = generate_state_token();
        LoginRedirect {
            url: self.provider.authorization_url(&state_token),
            state_token,
        }
    }

    /// PendingProviderCallback → Authenticated, or back to Anonymous
    ///
    /// # Steps
    /// 1. Verify the returned state matches the one issued for this attempt
    /// 2. Exchange the code for an access token
    /// 3. Resolve the principal
    /// 4. Issue an authenticated session
    ///
    /// The provider is never called when the state check fails.
    pub async fn complete_login(
        &self,
        expected_state: Option<&str>,
        returned_state: Option<&str>,
        code: Option<&str>,
    ) -> Result<Session, LoginError> {
        self.verify_state(expected_state, returned_state)?;

        let code = code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| ProviderError::ExchangeFailed("authorization code missing".into()))?;

        let access_token = self.provider.exchange_code(code).await?;
        let principal = self.provider.fetch_principal(&access_token).await?;

        Ok(self.codec.issue(principal))
    }

    fn verify_state(&self, expected: Option<&str>, returned: Option<&str>) -> Result<(), LoginError> {
        match (expected, returned) {
            (Some(expected), Some(returned))
                if !expected.is_empty() && self.codec.tokens_match(expected, returned) =>
            {
                Ok(())
            }
            _ => Err(LoginError::CsrfStateMismatch),
        }
    }
}

/// Generate a random anti-forgery state token
pub fn generate_state_token() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
