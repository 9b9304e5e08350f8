//! Counter synchronizer
//!
//! Adjusts the three denormalized per-post counters with the
//! consistency profile each one warrants:
//!
//! - view count: atomic in-store increment, with a read-then-write
//!   fallback when the atomic path errors. The fallback has a race
//!   window (two concurrent readers can both write the same value,
//!   undercounting); that lossy guarantee is intentional.
//! - like count: read-then-write with an optimistic display value
//!   returned before the write resolves, and no rollback on failure.
//! - comment count: recomputed from an actual COUNT of comment rows
//!   after each insert. This is the accurate template.

use std::sync::Arc;

use crate::data::Database;
use crate::error::AppError;
use crate::metrics::COUNTER_SYNC_TOTAL;

/// Counter synchronizer service
pub struct CounterService {
    db: Arc<Database>,
}

impl CounterService {
    /// Create new counter service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // View count
    // =========================================================================

    /// Record one view of a post, best-effort.
    ///
    /// Tries the atomic increment first and degrades to the
    /// read-then-write fallback on error. Failures never propagate to
    /// the detail-page load that triggered them.
    pub async fn record_view(&self, post_id: &str) {
        match self.db.increment_view_count(post_id).await {
            Ok(_) => {
                COUNTER_SYNC_TOTAL
                    .with_label_values(&["view", "atomic"])
                    .inc();
            }
            Err(error) => {
                tracing::warn!(
                    post_id,
                    %error,
                    "Atomic view increment failed; using read-then-write fallback"
                );
                if let Err(error) = self.record_view_fallback(post_id).await {
                    tracing::warn!(post_id, %error, "View count fallback failed");
                }
            }
        }
    }

    /// Read-then-write view increment.
    ///
    /// Concurrent callers can both read the same pre-increment value
    /// and both write the same post-increment value, losing one count.
    pub async fn record_view_fallback(&self, post_id: &str) -> Result<(), AppError> {
        if let Some(current) = self.db.get_view_count(post_id).await? {
            self.db.set_view_count(post_id, current + 1).await?;
            COUNTER_SYNC_TOTAL
                .with_label_values(&["view", "fallback"])
                .inc();
        }
        Ok(())
    }

    // =========================================================================
    // Like count
    // =========================================================================

    /// Record a like and return the optimistic display value.
    ///
    /// The returned value is computed before the write resolves; a
    /// failed write is logged, not rolled back, leaving the caller's
    /// display out of sync with the store until the next full load.
    pub async fn record_like(&self, post_id: &str) -> Result<i64, AppError> {
        let current = self
            .db
            .get_like_count(post_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let optimistic = current + 1;

        if let Err(error) = self.db.set_like_count(post_id, optimistic).await {
            tracing::warn!(post_id, %error, "Like count write failed; display value kept");
        } else {
            COUNTER_SYNC_TOTAL
                .with_label_values(&["like", "read_then_write"])
                .inc();
        }

        Ok(optimistic)
    }

    // =========================================================================
    // Comment count
    // =========================================================================

    /// Recompute a post's comment count from its actual comment rows
    /// and write the result onto the post.
    pub async fn recompute_comment_count(&self, post_id: &str) -> Result<i64, AppError> {
        let count = self.db.count_comments(post_id).await?;
        self.db.set_comment_count(post_id, count).await?;
        COUNTER_SYNC_TOTAL
            .with_label_values(&["comment", "recount"])
            .inc();
        Ok(count)
    }
}
