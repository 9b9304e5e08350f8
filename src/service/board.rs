//! Community board service
//!
//! Handles post and comment operations: listing with notice-first
//! sorting, creation with nickname capture and best-effort image
//! upload, admin-gated edits and deletes, and the comment flow with
//! its accurate count recompute.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AdminConfig;
use crate::data::{
    Comment, ContentBlock, Database, EntityId, ImageAlign, ImageSize, Post, PostCategory,
    PostSortKey, Profile, decode_content, encode_blocks, preview_excerpt,
};
use crate::error::AppError;
use crate::service::CounterService;
use crate::storage::MediaStorage;

const PREVIEW_MAX_CHARS: usize = 120;
const ANONYMOUS_NICKNAME: &str = "anonymous";

/// Raw image payload attached to a post
pub struct PostImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Input for creating a post
///
/// The editor produces text around at most one image; the codec turns
/// that into the persisted marker payload.
pub struct NewPost {
    pub title: String,
    pub text_before: String,
    pub text_after: String,
    pub category: PostCategory,
    pub image: Option<PostImage>,
    pub image_size: ImageSize,
    pub image_align: ImageAlign,
}

/// Input for editing a post (admin only)
///
/// `content` is the raw persisted payload, marker included, as the
/// edit form round-trips it.
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub image: Option<PostImage>,
    pub image_size: Option<ImageSize>,
    pub image_align: Option<ImageAlign>,
}

/// List-view projection of a post
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub nickname: String,
    pub title: String,
    /// Marker-free excerpt; image-only posts get a placeholder label
    pub excerpt: String,
    pub category: String,
    pub has_image: bool,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

impl PostSummary {
    fn from_post(post: Post) -> Self {
        let excerpt = preview_excerpt(&post.content, PREVIEW_MAX_CHARS);
        Self {
            id: post.id,
            nickname: post.nickname,
            title: post.title,
            excerpt,
            category: post.category,
            has_image: post.image_url.is_some(),
            view_count: post.view_count,
            like_count: post.like_count,
            comment_count: post.comment_count,
            created_at: post.created_at,
        }
    }
}

/// Detail-view projection: the post, its comments ascending, and the
/// decoded block sequence for edit re-entry
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub blocks: Vec<ContentBlock>,
}

impl PostDetail {
    fn assemble(post: Post, comments: Vec<Comment>) -> Self {
        let blocks = decode_content(&post.content, post.image_url.as_deref());
        Self {
            post,
            comments,
            blocks,
        }
    }
}

/// Community board service
pub struct BoardService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
    counters: CounterService,
    admin: AdminConfig,
}

impl BoardService {
    /// Create new board service
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>, admin: AdminConfig) -> Self {
        let counters = CounterService::new(db.clone());
        Self {
            db,
            storage,
            counters,
            admin,
        }
    }

    fn is_admin(&self, profile: Option<&Profile>) -> bool {
        profile.is_some_and(|profile| profile.is_admin(&self.admin.username))
    }

    /// Nickname captured onto posts and comments at write time
    fn display_nickname(&self, profile: Option<&Profile>) -> String {
        match profile {
            Some(profile) if profile.is_admin(&self.admin.username) => self.admin.nickname.clone(),
            Some(profile) => profile.nickname.clone(),
            None => ANONYMOUS_NICKNAME.to_string(),
        }
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// List posts, optionally filtered by category.
    ///
    /// Notice posts partition before all others regardless of the
    /// chosen sort key; within each partition the key applies
    /// descending. The underlying fetch is newest-first and the sort
    /// is stable, so ties keep that order within a single render.
    pub async fn list_posts(
        &self,
        category: Option<PostCategory>,
        sort: PostSortKey,
    ) -> Result<Vec<PostSummary>, AppError> {
        let mut posts = self.db.list_posts(category.map(|c| c.as_str())).await?;
        sort_posts(&mut posts, sort);
        Ok(posts.into_iter().map(PostSummary::from_post).collect())
    }

    /// Create a new post
    ///
    /// # Side Effects
    /// - Uploads the optional image first; an upload failure is logged
    ///   and the post is created without the image
    /// - Inserts the post row with counters at zero
    pub async fn create_post(
        &self,
        author_id: &str,
        profile: Option<&Profile>,
        input: NewPost,
    ) -> Result<Post, AppError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("post title is required".to_string()));
        }

        if input.category == PostCategory::Notice && !self.is_admin(profile) {
            return Err(AppError::Forbidden);
        }

        let text_before = input.text_before.trim().to_string();
        let text_after = input.text_after.trim().to_string();
        if text_before.is_empty() && text_after.is_empty() && input.image.is_none() {
            return Err(AppError::Validation(
                "post content or image is required".to_string(),
            ));
        }

        let post_id = EntityId::new().0;

        let image_url = match input.image {
            Some(image) => {
                match self
                    .storage
                    .upload_community_image(&post_id, image.data, &image.content_type)
                    .await
                {
                    Ok((_key, url)) => Some(url),
                    Err(error) => {
                        tracing::warn!(
                            %error,
                            post_id = %post_id,
                            "Post image upload failed; creating post without image"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let mut blocks = Vec::new();
        if !text_before.is_empty() {
            blocks.push(ContentBlock::Text { text: text_before });
        }
        if let Some(url) = &image_url {
            blocks.push(ContentBlock::Image { url: url.clone() });
        }
        if !text_after.is_empty() {
            blocks.push(ContentBlock::Text { text: text_after });
        }
        let encoded = encode_blocks(&blocks)?;

        let has_image = encoded.image_url.is_some();
        let post = Post {
            id: post_id,
            author_id: Some(author_id.to_string()),
            nickname: self.display_nickname(profile),
            title,
            content: encoded.content,
            category: input.category.as_str().to_string(),
            image_url: encoded.image_url,
            image_size: has_image.then(|| input.image_size.as_str().to_string()),
            image_align: has_image.then(|| input.image_align.as_str().to_string()),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            created_at: Utc::now(),
        };

        self.db.insert_post(&post).await?;
        crate::metrics::POSTS_CREATED_TOTAL.inc();

        Ok(post)
    }

    /// Load a post detail page: bump the view counter first, then
    /// fetch the post and its comments so the incremented value is
    /// what comes back.
    pub async fn load_post_detail(&self, id: &str) -> Result<PostDetail, AppError> {
        self.counters.record_view(id).await;

        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        let comments = self.db.get_comments_for_post(id).await?;
        Ok(PostDetail::assemble(post, comments))
    }

    /// Record a like and return the optimistic display value; the
    /// counter service documents the consistency profile.
    pub async fn like_post(&self, id: &str) -> Result<i64, AppError> {
        self.counters.record_like(id).await
    }

    /// Update a post (admin only)
    pub async fn update_post(
        &self,
        profile: Option<&Profile>,
        id: &str,
        update: PostUpdate,
    ) -> Result<Post, AppError> {
        if !self.is_admin(profile) {
            return Err(AppError::Forbidden);
        }

        let existing = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;

        let title = update.title.trim();
        let content = update.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::Validation(
                "post title and content are required".to_string(),
            ));
        }

        // Replacement image is best-effort like creation: on upload
        // failure the existing image is kept.
        let image_url = match update.image {
            Some(image) => {
                match self
                    .storage
                    .upload_community_image(id, image.data, &image.content_type)
                    .await
                {
                    Ok((_key, url)) => Some(url),
                    Err(error) => {
                        tracing::warn!(
                            %error,
                            post_id = id,
                            "Replacement image upload failed; keeping existing image"
                        );
                        existing.image_url.clone()
                    }
                }
            }
            None => existing.image_url.clone(),
        };

        let image_size = update
            .image_size
            .map(|size| size.as_str().to_string())
            .or(existing.image_size);
        let image_align = update
            .image_align
            .map(|align| align.as_str().to_string())
            .or(existing.image_align);

        let updated = self
            .db
            .update_post(
                id,
                title,
                content,
                update.category.as_str(),
                image_url.as_deref(),
                image_size.as_deref(),
                image_align.as_deref(),
            )
            .await?;
        if !updated {
            return Err(AppError::NotFound);
        }

        self.db.get_post(id).await?.ok_or(AppError::NotFound)
    }

    /// Delete a post (admin only)
    ///
    /// Hard delete. The post's comments are not removed with it.
    pub async fn delete_post(&self, profile: Option<&Profile>, id: &str) -> Result<(), AppError> {
        if !self.is_admin(profile) {
            return Err(AppError::Forbidden);
        }

        self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        self.db.delete_post(id).await
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Add a comment to a post.
    ///
    /// # Side Effects
    /// - Recomputes the post's comment count from actual rows
    /// - Returns the refreshed post + comments (full refetch, no
    ///   incremental patch)
    pub async fn add_comment(
        &self,
        user_id: &str,
        profile: Option<&Profile>,
        post_id: &str,
        content: &str,
    ) -> Result<PostDetail, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "comment content is required".to_string(),
            ));
        }

        self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;

        let comment = Comment {
            id: EntityId::new().0,
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            nickname: self.display_nickname(profile),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_comment(&comment).await?;
        crate::metrics::COMMENTS_CREATED_TOTAL.inc();

        self.counters.recompute_comment_count(post_id).await?;

        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;
        let comments = self.db.get_comments_for_post(post_id).await?;
        Ok(PostDetail::assemble(post, comments))
    }

    /// Delete a comment (admin only). The owning post's stored count
    /// is not recomputed here; it catches up on the next insert.
    pub async fn delete_comment(
        &self,
        profile: Option<&Profile>,
        comment_id: &str,
    ) -> Result<(), AppError> {
        if !self.is_admin(profile) {
            return Err(AppError::Forbidden);
        }

        self.db
            .get_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.delete_comment(comment_id).await
    }
}

/// Notice-first partition, then the chosen key descending.
///
/// `sort_by` is stable, so equal keys keep the incoming newest-first
/// order.
fn sort_posts(posts: &mut [Post], sort: PostSortKey) {
    posts.sort_by(|a, b| {
        let a_notice = a.category == PostCategory::Notice.as_str();
        let b_notice = b.category == PostCategory::Notice.as_str();
        b_notice.cmp(&a_notice).then_with(|| match sort {
            PostSortKey::Newest => b.created_at.cmp(&a.created_at),
            PostSortKey::Views => b.view_count.cmp(&a.view_count),
            PostSortKey::Likes => b.like_count.cmp(&a.like_count),
            PostSortKey::Comments => b.comment_count.cmp(&a.comment_count),
        })
    });
}
