//! Review endpoints
//!
//! Anonymous one-line reviews: list newest-first, create with length
//! limits. No authentication either way.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::data::Review;
use crate::error::AppError;
use crate::service::ReviewService;

#[derive(Debug, Deserialize)]
struct CreateReviewRequest {
    nickname: String,
    content: String,
}

/// GET /api/reviews
async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = ReviewService::new(state.db.clone()).list_reviews().await?;
    Ok(Json(reviews))
}

/// POST /api/reviews
async fn create_review(
    State(state): State<AppState>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let review = ReviewService::new(state.db.clone())
        .add_review(&request.nickname, &request.content)
        .await?;
    Ok(Json(review))
}

/// Create reviews router
pub fn reviews_router() -> Router<AppState> {
    Router::new().route("/reviews", get(list_reviews).post(create_review))
}
