//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime-bound queries and file-based migrations.

use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Open (creating if needed) the database at `path` and bring the
    /// schema up to date.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // mode=rwc: create the file on first run
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path.display())).await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
        })?;

        tracing::info!(path = %path.display(), "Database connected and migrated");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users / Profiles
    // =========================================================================

    /// Insert an auth user and their profile in one transaction.
    ///
    /// The email and username uniqueness checks run inside the same
    /// write transaction, so either both rows land or neither does.
    ///
    /// # Errors
    /// Returns a validation error when the email or username is taken.
    pub async fn insert_user_with_profile(
        &self,
        user: &AuthUser,
        profile: &Profile,
    ) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result: Result<(), AppError> = async {
            let email_taken =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
                    .bind(&user.email)
                    .fetch_one(&mut *conn)
                    .await?;
            if email_taken > 0 {
                return Err(AppError::Validation(
                    "email is already registered".to_string(),
                ));
            }

            let username_taken =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles WHERE username = ?")
                    .bind(&profile.username)
                    .fetch_one(&mut *conn)
                    .await?;
            if username_taken > 0 {
                return Err(AppError::Validation(
                    "username is already taken".to_string(),
                ));
            }

            sqlx::query(
                "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&mut *conn)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO profiles (
                    id, username, nickname, role, phone, address, avatar_url, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&profile.id)
            .bind(&profile.username)
            .bind(&profile.nickname)
            .bind(&profile.role)
            .bind(&profile.phone)
            .bind(&profile.address)
            .bind(&profile.avatar_url)
            .bind(profile.created_at)
            .execute(&mut *conn)
            .await?;

            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(())
            }
            Err(error) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(error)
            }
        }
    }

    /// Get auth user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AppError> {
        let user = sqlx::query_as::<_, AuthUser>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get auth user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<AuthUser>, AppError> {
        let user = sqlx::query_as::<_, AuthUser>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get profile by user ID
    pub async fn get_profile(&self, id: &str) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Patch profile display fields by user ID.
    ///
    /// Use `None` for omitted fields (no change).
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching profile row exists.
    pub async fn patch_profile(
        &self,
        id: &str,
        nickname: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET nickname = COALESCE(?, nickname),
                phone = COALESCE(?, phone),
                address = COALESCE(?, address)
            WHERE id = ?
            "#,
        )
        .bind(nickname)
        .bind(phone)
        .bind(address)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Update profile avatar URL by user ID.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching profile row exists.
    pub async fn update_profile_avatar(
        &self,
        id: &str,
        avatar_url: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE profiles SET avatar_url = ? WHERE id = ?")
            .bind(avatar_url)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    #[cfg(test)]
    pub(crate) async fn delete_profile_for_test(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM community_posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// List posts, optionally filtered by category.
    ///
    /// Rows come back newest-first; the notice-first partitioning and
    /// the alternate sort keys are applied by the board service.
    pub async fn list_posts(&self, category: Option<&str>) -> Result<Vec<Post>, AppError> {
        let posts = match category {
            Some(category) => {
                sqlx::query_as::<_, Post>(
                    "SELECT * FROM community_posts WHERE category = ? ORDER BY created_at DESC",
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Post>("SELECT * FROM community_posts ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(posts)
    }

    /// Insert a new post
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO community_posts (
                id, author_id, nickname, title, content, category,
                image_url, image_size, image_align,
                view_count, like_count, comment_count, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.nickname)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.category)
        .bind(&post.image_url)
        .bind(&post.image_size)
        .bind(&post.image_align)
        .bind(post.view_count)
        .bind(post.like_count)
        .bind(post.comment_count)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update an existing post's editable fields
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching post row exists.
    pub async fn update_post(
        &self,
        id: &str,
        title: &str,
        content: &str,
        category: &str,
        image_url: Option<&str>,
        image_size: Option<&str>,
        image_align: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE community_posts
            SET title = ?, content = ?, category = ?,
                image_url = ?, image_size = ?, image_align = ?
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(category)
        .bind(image_url)
        .bind(image_size)
        .bind(image_align)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete post by ID
    ///
    /// Hard delete. Does not touch the post's comments.
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM community_posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Atomically increment a post's view count in the store.
    ///
    /// # Returns
    /// `true` when a row was incremented, `false` for an unknown post.
    pub async fn increment_view_count(&self, post_id: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE community_posts SET view_count = view_count + 1 WHERE id = ?")
                .bind(post_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Read a single counter column for the read-then-write fallback.
    pub async fn get_view_count(&self, post_id: &str) -> Result<Option<i64>, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT view_count FROM community_posts WHERE id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }

    /// Blind-write a post's view count (fallback path; may lose
    /// concurrent updates).
    pub async fn set_view_count(&self, post_id: &str, value: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE community_posts SET view_count = ? WHERE id = ?")
            .bind(value)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_like_count(&self, post_id: &str) -> Result<Option<i64>, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT like_count FROM community_posts WHERE id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }

    /// Blind-write a post's like count (read-then-write path; may lose
    /// concurrent updates).
    pub async fn set_like_count(&self, post_id: &str, value: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE community_posts SET like_count = ? WHERE id = ?")
            .bind(value)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Count actual comment rows for a post
    pub async fn count_comments(&self, post_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM community_comments WHERE post_id = ?",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Write the authoritative comment count onto the post row
    pub async fn set_comment_count(&self, post_id: &str, value: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE community_posts SET comment_count = ? WHERE id = ?")
            .bind(value)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a new comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO community_comments (
                id, post_id, user_id, nickname, content, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.user_id)
        .bind(&comment.nickname)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get comments for a post, ascending by creation time
    pub async fn get_comments_for_post(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM community_comments WHERE post_id = ? ORDER BY created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM community_comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Delete comment by ID
    pub async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM community_comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Insert a new review
    pub async fn insert_review(&self, review: &Review) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO reviews (id, nickname, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&review.id)
        .bind(&review.nickname)
        .bind(&review.content)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List reviews, newest first
    pub async fn list_reviews(&self) -> Result<Vec<Review>, AppError> {
        let reviews =
            sqlx::query_as::<_, Review>("SELECT * FROM reviews ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(reviews)
    }
}
