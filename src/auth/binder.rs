//! Session/profile binder
//!
//! Bridges a session token to a stable identity for the rest of the
//! application. Recovery of an existing session is time-bounded: on
//! timeout or error the caller proceeds anonymous rather than block.
//! The profile fetch retries a fixed number of times with a fixed
//! delay; repeated failure yields an authenticated identity with
//! `profile = None` ("identity known, display attributes unknown"),
//! never an anonymous one.

use std::sync::Arc;
use std::time::Duration;

use super::session::verify_session_token;
use crate::data::{AuthUser, Database, Profile};
use crate::error::AppError;

const PROFILE_FETCH_ATTEMPTS: u32 = 3;
const PROFILE_FETCH_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Resolved identity for one request/session
#[derive(Debug, Clone)]
pub enum Identity {
    /// No usable session
    Anonymous,
    /// Explicit "continue without an account" pseudo-session;
    /// distinct from Authenticated and replaced by any real login
    Guest,
    /// Known user; profile may be unavailable
    Authenticated {
        user: AuthUser,
        profile: Option<Profile>,
    },
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }
}

/// Session/profile binder
pub struct SessionBinder {
    db: Arc<Database>,
    session_secret: String,
    recover_timeout: Duration,
}

impl SessionBinder {
    /// Create new binder
    pub fn new(db: Arc<Database>, session_secret: String, recover_timeout: Duration) -> Self {
        Self {
            db,
            session_secret,
            recover_timeout,
        }
    }

    /// Resolve a session token to an identity.
    ///
    /// Never returns an error: recovery failures and timeouts degrade
    /// to `Anonymous` so callers are never blocked on a broken store.
    pub async fn resolve(&self, token: Option<&str>) -> Identity {
        let Some(token) = token else {
            return Identity::Anonymous;
        };

        match tokio::time::timeout(self.recover_timeout, self.recover(token)).await {
            Ok(Ok(identity)) => identity,
            Ok(Err(error)) => {
                tracing::warn!(%error, "Session recovery failed; proceeding anonymous");
                Identity::Anonymous
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.recover_timeout.as_millis() as u64,
                    "Session recovery timed out; proceeding anonymous"
                );
                Identity::Anonymous
            }
        }
    }

    async fn recover(&self, token: &str) -> Result<Identity, AppError> {
        let session = verify_session_token(token, &self.session_secret)?;

        if session.guest {
            return Ok(Identity::Guest);
        }

        let Some(user_id) = session.user_id else {
            return Ok(Identity::Anonymous);
        };

        let Some(user) = self.db.get_user(&user_id).await? else {
            // Token signed for an account that no longer exists.
            return Ok(Identity::Anonymous);
        };

        let profile = self.fetch_profile_with_retry(&user.id).await;
        Ok(Identity::Authenticated { user, profile })
    }

    /// Fetch the profile with a fixed attempt count and fixed delay.
    ///
    /// A definitive "no row" answer stops the retries immediately;
    /// only store errors are retried.
    async fn fetch_profile_with_retry(&self, user_id: &str) -> Option<Profile> {
        for attempt in 1..=PROFILE_FETCH_ATTEMPTS {
            match self.db.get_profile(user_id).await {
                Ok(found) => return found,
                Err(error) => {
                    tracing::warn!(
                        %error,
                        attempt,
                        max_attempts = PROFILE_FETCH_ATTEMPTS,
                        "Profile fetch failed"
                    );
                    if attempt < PROFILE_FETCH_ATTEMPTS {
                        tokio::time::sleep(PROFILE_FETCH_RETRY_DELAY).await;
                    }
                }
            }
        }
        None
    }
}
