//! Authentication endpoints
//!
//! Sign-up, password sign-in, guest mode, session resolution, and
//! sign-out. Session tokens travel both as an HttpOnly cookie and in
//! the response body for Bearer clients.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::middleware::extract_token_from_headers;
use crate::auth::{Identity, Session, create_session_token};
use crate::data::{AuthUser, Profile, ProfileRole};
use crate::error::AppError;
use crate::service::{AccountService, ProfilePatch, SignUp};

const SESSION_COOKIE: &str = "session";

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .build()
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    username: String,
    nickname: Option<String>,
    role: Option<String>,
    phone: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: AuthUser,
    profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<AuthUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<Profile>,
}

/// POST /api/auth/signup
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let role = match request.role.as_deref() {
        None => ProfileRole::User,
        Some(raw) => ProfileRole::parse(raw).ok_or_else(|| {
            AppError::Validation("role must be one of: user, expert, owner".to_string())
        })?,
    };

    let service = AccountService::new(state.db.clone(), state.storage.clone());
    let (user, profile) = service
        .sign_up(SignUp {
            email: request.email,
            password: request.password,
            username: request.username,
            nickname: request.nickname,
            role,
            phone: request.phone,
            address: request.address,
        })
        .await?;

    let session = Session::for_user(
        user.id.clone(),
        user.email.clone(),
        state.config.auth.session_max_age,
    );
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    let jar = jar.add(session_cookie(
        token.clone(),
        state.config.should_use_secure_cookies(),
    ));

    Ok((
        jar,
        Json(AuthResponse {
            token,
            user,
            profile: Some(profile),
        }),
    ))
}

/// POST /api/auth/login
///
/// A successful login replaces whatever session cookie was present,
/// guest cookies included.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let service = AccountService::new(state.db.clone(), state.storage.clone());
    let (user, profile) = service.sign_in(&request.email, &request.password).await?;

    let session = Session::for_user(
        user.id.clone(),
        user.email.clone(),
        state.config.auth.session_max_age,
    );
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    let jar = jar.add(session_cookie(
        token.clone(),
        state.config.should_use_secure_cookies(),
    ));

    Ok((jar, Json(AuthResponse { token, user, profile })))
}

/// POST /api/auth/guest
///
/// Issues a guest pseudo-session without touching the store.
async fn guest(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    let session = Session::guest(state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    let jar = jar.add(session_cookie(
        token.clone(),
        state.config.should_use_secure_cookies(),
    ));

    Ok((
        jar,
        Json(serde_json::json!({
            "token": token,
            "guest": true,
        })),
    ))
}

/// GET /api/auth/session
///
/// Resolves the caller's identity through the session binder:
/// bounded recovery, bounded profile retries, anonymous on failure.
async fn session(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionResponse> {
    let token = extract_token_from_headers(&headers);
    let identity = state.binder().resolve(token.as_deref()).await;

    let response = match identity {
        Identity::Anonymous => SessionResponse {
            status: "anonymous",
            user: None,
            profile: None,
        },
        Identity::Guest => SessionResponse {
            status: "guest",
            user: None,
            profile: None,
        },
        Identity::Authenticated { user, profile } => SessionResponse {
            status: "authenticated",
            user: Some(user),
            profile,
        },
    };

    Json(response)
}

/// POST /api/auth/logout
///
/// Unconditional from the caller's perspective: the cookie is cleared
/// no matter what state it was in.
async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(removal_cookie());
    (jar, Json(serde_json::json!({ "signed_out": true })))
}

/// GET /api/profile
async fn get_profile(
    State(state): State<AppState>,
    user: crate::auth::CurrentUser,
) -> Result<Json<Profile>, AppError> {
    let user_id = user.0.user_id.ok_or(AppError::Unauthorized)?;
    let service = AccountService::new(state.db.clone(), state.storage.clone());
    let profile = service.get_profile(&user_id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
struct ProfilePatchRequest {
    nickname: Option<String>,
    phone: Option<String>,
    address: Option<String>,
}

/// PATCH /api/profile
async fn patch_profile(
    State(state): State<AppState>,
    user: crate::auth::CurrentUser,
    Json(request): Json<ProfilePatchRequest>,
) -> Result<Json<Profile>, AppError> {
    let user_id = user.0.user_id.ok_or(AppError::Unauthorized)?;
    let service = AccountService::new(state.db.clone(), state.storage.clone());
    let profile = service
        .update_profile(
            &user_id,
            ProfilePatch {
                nickname: request.nickname,
                phone: request.phone,
                address: request.address,
            },
        )
        .await?;
    Ok(Json(profile))
}

/// POST /api/profile/avatar
///
/// Body is the raw WebP image.
async fn upload_avatar(
    State(state): State<AppState>,
    user: crate::auth::CurrentUser,
    body: axum::body::Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = user.0.user_id.ok_or(AppError::Unauthorized)?;
    let service = AccountService::new(state.db.clone(), state.storage.clone());
    let avatar_url = service.update_avatar(&user_id, body.to_vec()).await?;
    Ok(Json(serde_json::json!({ "avatar_url": avatar_url })))
}

/// Create auth router
///
/// Authentication on the profile routes is enforced by the
/// CurrentUser extractor in the handlers.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/guest", post(guest))
        .route("/auth/session", get(session))
        .route("/auth/logout", post(logout))
        .route("/profile", get(get_profile).patch(patch_profile))
        .route("/profile/avatar", post(upload_avatar))
}
