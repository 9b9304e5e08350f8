//! Data models
//!
//! Rust structs representing database entities and the local
//! diagnosis ledger. All models use ULID for IDs and chrono for
//! timestamps; enumerated columns are stored as strings with typed
//! helpers alongside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Auth user / Profile
// =============================================================================

/// Authentication account row
///
/// Holds only credentials; display attributes live on [`Profile`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    /// bcrypt hash, never the raw password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User profile row
///
/// `id` equals the auth user id. Created in the same transaction as
/// the auth row at sign-up.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    /// Unique handle; one reserved value denotes the platform admin
    pub username: String,
    /// Display name shown on posts and comments
    pub nickname: String,
    /// Role: user, expert, owner
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// The single authorization check for admin-only operations.
    ///
    /// Admin detection is username equality against the one reserved
    /// value from configuration; every privileged path goes through
    /// here rather than comparing strings inline.
    pub fn is_admin(&self, reserved_username: &str) -> bool {
        self.username == reserved_username
    }
}

/// Profile roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRole {
    User,
    Expert,
    Owner,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Expert => "expert",
            Self::Owner => "owner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "expert" => Some(Self::Expert),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }
}

// =============================================================================
// Community board
// =============================================================================

/// A community post
///
/// `content` may embed one image through the `[IMAGE]` marker; the
/// codec in [`crate::data::content`] owns that encoding. The three
/// counters are denormalized and only ever adjusted through the
/// counter service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    /// Author id; None for anonymous posts
    pub author_id: Option<String>,
    /// Display nickname captured at creation time (not live-joined)
    pub nickname: String,
    pub title: String,
    pub content: String,
    /// Category: notice, question, info, experience
    pub category: String,
    /// Public URL of the embedded image, if any
    pub image_url: Option<String>,
    /// Image size class: small, medium, large
    pub image_size: Option<String>,
    /// Image alignment class: left, center, right
    pub image_align: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Post categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCategory {
    /// Admin-only; always sorts first
    Notice,
    Question,
    Info,
    Experience,
}

impl PostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::Question => "question",
            Self::Info => "info",
            Self::Experience => "experience",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "notice" => Some(Self::Notice),
            "question" => Some(Self::Question),
            "info" => Some(Self::Info),
            "experience" => Some(Self::Experience),
            _ => None,
        }
    }
}

/// Sort keys for the post list
///
/// Whatever the key, notice posts partition before all others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSortKey {
    #[default]
    Newest,
    Views,
    Likes,
    Comments,
}

impl PostSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Views => "views",
            Self::Likes => "likes",
            Self::Comments => "comments",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "newest" => Some(Self::Newest),
            "views" => Some(Self::Views),
            "likes" => Some(Self::Likes),
            "comments" => Some(Self::Comments),
            _ => None,
        }
    }
}

/// A comment on a post
///
/// Displayed ascending by creation time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    /// Denormalized nickname; admin label substituted for admins
    pub nickname: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Reviews
// =============================================================================

/// One-line service review, listed newest-first
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: String,
    pub nickname: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Diagnosis (local ledger only, never persisted to the database)
// =============================================================================

/// Self-diagnosis outcome stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisStage {
    Normal,
    Caution,
    Risk,
}

impl DiagnosisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Caution => "caution",
            Self::Risk => "risk",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Self::Normal),
            "caution" => Some(Self::Caution),
            "risk" => Some(Self::Risk),
            _ => None,
        }
    }
}

/// A mock diagnosis result
///
/// Lives only in the capped local ledger; the id is derived from the
/// creation timestamp (`diag_<unix_millis>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub id: String,
    pub stage: DiagnosisStage,
    /// Fraction in [0, 1]
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub summary: String,
    pub guide_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_strings() {
        for category in [
            PostCategory::Notice,
            PostCategory::Question,
            PostCategory::Info,
            PostCategory::Experience,
        ] {
            assert_eq!(PostCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(PostCategory::parse("general"), None);
    }

    #[test]
    fn sort_key_defaults_to_newest() {
        assert_eq!(PostSortKey::default(), PostSortKey::Newest);
        assert_eq!(PostSortKey::parse("likes"), Some(PostSortKey::Likes));
        assert_eq!(PostSortKey::parse("oldest"), None);
    }

    #[test]
    fn admin_check_matches_reserved_username_only() {
        let profile = Profile {
            id: EntityId::new().0,
            username: "modamadmin".to_string(),
            nickname: "Modam Admin".to_string(),
            role: "owner".to_string(),
            phone: None,
            address: None,
            avatar_url: None,
            created_at: Utc::now(),
        };
        assert!(profile.is_admin("modamadmin"));
        assert!(!profile.is_admin("someoneelse"));
    }
}
