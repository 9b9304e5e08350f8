//! Authentication extractors
//!
//! Write handlers take [`CurrentUser`] to require a signed-in,
//! non-guest session; read handlers stay public.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::session::{Session, verify_session_token};
use crate::AppState;
use crate::error::AppError;

/// Pull the session token from a Bearer header or the session cookie
pub(crate) fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get("session").map(|cookie| cookie.value().to_owned())
        })
}

/// Extractor for the current signed-in user
///
/// Rejects missing, invalid, and guest sessions: a guest
/// pseudo-session is not an authenticated actor for write operations.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(session): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", session.email.unwrap_or_default())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = match parts.extensions.get::<Session>().cloned() {
            Some(session) => session,
            None => {
                let app_state = AppState::from_ref(state);
                let token =
                    extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
                let session =
                    verify_session_token(&token, &app_state.config.auth.session_secret)?;
                parts.extensions.insert(session.clone());
                session
            }
        };

        if session.guest || session.user_id.is_none() {
            return Err(AppError::Unauthorized);
        }

        Ok(CurrentUser(session))
    }
}
