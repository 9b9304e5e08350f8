//! Review service
//!
//! One-line anonymous service reviews: a nickname, up to 80
//! characters of text, listed newest-first.

use std::sync::Arc;

use crate::data::{Database, EntityId, Review};
use crate::error::AppError;

const MAX_NICKNAME_CHARS: usize = 20;
const MAX_CONTENT_CHARS: usize = 80;

/// Review service
pub struct ReviewService {
    db: Arc<Database>,
}

impl ReviewService {
    /// Create new review service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Add a review
    pub async fn add_review(&self, nickname: &str, content: &str) -> Result<Review, AppError> {
        let nickname = nickname.trim();
        let content = content.trim();
        if nickname.is_empty() || content.is_empty() {
            return Err(AppError::Validation(
                "both a nickname and review text are required".to_string(),
            ));
        }
        if nickname.chars().count() > MAX_NICKNAME_CHARS {
            return Err(AppError::Validation(format!(
                "nickname must be at most {} characters",
                MAX_NICKNAME_CHARS
            )));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::Validation(format!(
                "review text must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }

        let review = Review {
            id: EntityId::new().0,
            nickname: nickname.to_string(),
            content: content.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.db.insert_review(&review).await?;

        Ok(review)
    }

    /// All reviews, newest first
    pub async fn list_reviews(&self) -> Result<Vec<Review>, AppError> {
        self.db.list_reviews().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Database;
    use tempfile::TempDir;

    async fn create_service() -> (ReviewService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("reviews.db"))
                .await
                .unwrap(),
        );
        (ReviewService::new(db), temp_dir)
    }

    #[tokio::test]
    async fn add_and_list_reviews() {
        let (service, _temp_dir) = create_service().await;

        service.add_review("anon", "loved the report").await.unwrap();
        service.add_review("anon2", "quick and simple").await.unwrap();

        let reviews = service.list_reviews().await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].content, "quick and simple");
    }

    #[tokio::test]
    async fn add_review_validates_lengths() {
        let (service, _temp_dir) = create_service().await;

        assert!(matches!(
            service.add_review("", "text").await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service.add_review("anon", "").await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service.add_review("anon", &"x".repeat(81)).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            service
                .add_review(&"n".repeat(21), "text")
                .await
                .unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
