//! Community board endpoints
//!
//! Post listing/creation/detail, admin edits and deletes, likes, and
//! comments. Writes require a signed-in (non-guest) session via the
//! CurrentUser extractor; the list and detail views are public.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use base64::Engine as _;
use serde::Deserialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{ImageAlign, ImageSize, PostCategory, PostSortKey, Profile};
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{BoardService, NewPost, PostDetail, PostImage, PostSummary, PostUpdate};

fn board_service(state: &AppState) -> BoardService {
    BoardService::new(
        state.db.clone(),
        state.storage.clone(),
        state.config.admin.clone(),
    )
}

async fn load_profile(state: &AppState, user_id: &str) -> Result<Option<Profile>, AppError> {
    state.db.get_profile(user_id).await
}

fn parse_category(raw: Option<&str>) -> Result<Option<PostCategory>, AppError> {
    match raw {
        None | Some("") => Ok(None),
        Some(raw) => PostCategory::parse(raw).map(Some).ok_or_else(|| {
            AppError::Validation(
                "category must be one of: notice, question, info, experience".to_string(),
            )
        }),
    }
}

fn parse_image(
    base64_payload: Option<&str>,
    content_type: Option<&str>,
) -> Result<Option<PostImage>, AppError> {
    let Some(encoded) = base64_payload.filter(|payload| !payload.is_empty()) else {
        return Ok(None);
    };

    let data = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| AppError::Validation("image must be valid base64".to_string()))?;

    Ok(Some(PostImage {
        data,
        content_type: content_type.unwrap_or("image/jpeg").to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct ListPostsParams {
    category: Option<String>,
    sort: Option<String>,
}

/// GET /api/posts
async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<Vec<PostSummary>>, AppError> {
    let category = parse_category(params.category.as_deref())?;
    let sort = match params.sort.as_deref() {
        None | Some("") => PostSortKey::default(),
        Some(raw) => PostSortKey::parse(raw).ok_or_else(|| {
            AppError::Validation(
                "sort must be one of: newest, views, likes, comments".to_string(),
            )
        })?,
    };

    let started = Instant::now();
    let posts = board_service(&state).list_posts(category, sort).await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/posts", "200"])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/posts"])
        .observe(started.elapsed().as_secs_f64());

    Ok(Json(posts))
}

#[derive(Debug, Deserialize)]
struct CreatePostRequest {
    title: String,
    #[serde(default)]
    text_before: String,
    #[serde(default)]
    text_after: String,
    category: String,
    image_base64: Option<String>,
    image_content_type: Option<String>,
    image_size: Option<String>,
    image_align: Option<String>,
}

/// POST /api/posts
async fn create_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<crate::data::Post>, AppError> {
    let user_id = session.user_id.ok_or(AppError::Unauthorized)?;
    let profile = load_profile(&state, &user_id).await?;

    let category = PostCategory::parse(&request.category).ok_or_else(|| {
        AppError::Validation(
            "category must be one of: notice, question, info, experience".to_string(),
        )
    })?;

    let image = parse_image(
        request.image_base64.as_deref(),
        request.image_content_type.as_deref(),
    )?;

    let image_size = match request.image_size.as_deref() {
        None | Some("") => ImageSize::default(),
        Some(raw) => ImageSize::parse(raw).ok_or_else(|| {
            AppError::Validation("image_size must be one of: small, medium, large".to_string())
        })?,
    };
    let image_align = match request.image_align.as_deref() {
        None | Some("") => ImageAlign::default(),
        Some(raw) => ImageAlign::parse(raw).ok_or_else(|| {
            AppError::Validation("image_align must be one of: left, center, right".to_string())
        })?,
    };

    let post = board_service(&state)
        .create_post(
            &user_id,
            profile.as_ref(),
            NewPost {
                title: request.title,
                text_before: request.text_before,
                text_after: request.text_after,
                category,
                image,
                image_size,
                image_align,
            },
        )
        .await?;

    Ok(Json(post))
}

/// GET /api/posts/:id
///
/// Bumps the view counter first, then loads the post and comments so
/// the response carries the incremented count.
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostDetail>, AppError> {
    let started = Instant::now();
    let detail = board_service(&state).load_post_detail(&id).await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/posts/:id", "200"])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/posts/:id"])
        .observe(started.elapsed().as_secs_f64());

    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
struct UpdatePostRequest {
    title: String,
    content: String,
    category: String,
    image_base64: Option<String>,
    image_content_type: Option<String>,
    image_size: Option<String>,
    image_align: Option<String>,
}

/// PATCH /api/posts/:id (admin only)
async fn update_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<crate::data::Post>, AppError> {
    let user_id = session.user_id.ok_or(AppError::Unauthorized)?;
    let profile = load_profile(&state, &user_id).await?;

    let category = PostCategory::parse(&request.category).ok_or_else(|| {
        AppError::Validation(
            "category must be one of: notice, question, info, experience".to_string(),
        )
    })?;

    let image = parse_image(
        request.image_base64.as_deref(),
        request.image_content_type.as_deref(),
    )?;
    let image_size = request
        .image_size
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            ImageSize::parse(raw).ok_or_else(|| {
                AppError::Validation("image_size must be one of: small, medium, large".to_string())
            })
        })
        .transpose()?;
    let image_align = request
        .image_align
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            ImageAlign::parse(raw).ok_or_else(|| {
                AppError::Validation("image_align must be one of: left, center, right".to_string())
            })
        })
        .transpose()?;

    let post = board_service(&state)
        .update_post(
            profile.as_ref(),
            &id,
            PostUpdate {
                title: request.title,
                content: request.content,
                category,
                image,
                image_size,
                image_align,
            },
        )
        .await?;

    Ok(Json(post))
}

/// DELETE /api/posts/:id (admin only)
async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = session.user_id.ok_or(AppError::Unauthorized)?;
    let profile = load_profile(&state, &user_id).await?;

    board_service(&state).delete_post(profile.as_ref(), &id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /api/posts/:id/like
///
/// Returns the optimistic like count; no authentication required.
async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let like_count = board_service(&state).like_post(&id).await?;
    Ok(Json(serde_json::json!({ "like_count": like_count })))
}

#[derive(Debug, Deserialize)]
struct CreateCommentRequest {
    content: String,
}

/// POST /api/posts/:id/comments
///
/// Requires a signed-in session; returns the refreshed post with its
/// comments and the recounted comment total.
async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<PostDetail>, AppError> {
    let user_id = session.user_id.ok_or(AppError::Unauthorized)?;
    let profile = load_profile(&state, &user_id).await?;

    let detail = board_service(&state)
        .add_comment(&user_id, profile.as_ref(), &id, &request.content)
        .await?;
    Ok(Json(detail))
}

/// DELETE /api/comments/:id (admin only)
async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = session.user_id.ok_or(AppError::Unauthorized)?;
    let profile = load_profile(&state, &user_id).await?;

    board_service(&state)
        .delete_comment(profile.as_ref(), &id)
        .await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Create board router
pub fn board_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/posts/:id/like", post(like_post))
        .route("/posts/:id/comments", post(create_comment))
        .route("/comments/:id", delete(delete_comment))
}
