//! Database tests

use super::*;
use chrono::Utc;
use tempfile::TempDir;

use crate::error::AppError;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn sample_user(email: &str) -> AuthUser {
    AuthUser {
        id: EntityId::new().0,
        email: email.to_string(),
        password_hash: "bcrypt-hash".to_string(),
        created_at: Utc::now(),
    }
}

fn sample_profile(user: &AuthUser, username: &str) -> Profile {
    Profile {
        id: user.id.clone(),
        username: username.to_string(),
        nickname: username.to_string(),
        role: ProfileRole::User.as_str().to_string(),
        phone: None,
        address: None,
        avatar_url: None,
        created_at: Utc::now(),
    }
}

fn sample_post(title: &str, category: &str) -> Post {
    Post {
        id: EntityId::new().0,
        author_id: None,
        nickname: "anonymous".to_string(),
        title: title.to_string(),
        content: "body".to_string(),
        category: category.to_string(),
        image_url: None,
        image_size: None,
        image_align: None,
        view_count: 0,
        like_count: 0,
        comment_count: 0,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_signup_transaction_creates_both_rows() {
    let (db, _temp_dir) = create_test_db().await;

    let user = sample_user("a@example.com");
    let profile = sample_profile(&user, "alice");
    db.insert_user_with_profile(&user, &profile).await.unwrap();

    let loaded_user = db.get_user_by_email("a@example.com").await.unwrap();
    assert!(loaded_user.is_some());
    let loaded_profile = db.get_profile(&user.id).await.unwrap();
    assert_eq!(loaded_profile.unwrap().username, "alice");
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email_atomically() {
    let (db, _temp_dir) = create_test_db().await;

    let first = sample_user("a@example.com");
    db.insert_user_with_profile(&first, &sample_profile(&first, "alice"))
        .await
        .unwrap();

    let second = sample_user("a@example.com");
    let error = db
        .insert_user_with_profile(&second, &sample_profile(&second, "bob"))
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Validation(_)));

    // The rejected signup must not leave a profile row behind.
    assert!(db.get_profile(&second.id).await.unwrap().is_none());
    assert!(db.get_user(&second.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_post_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let post = sample_post("first post", "question");
    db.insert_post(&post).await.unwrap();

    let retrieved = db.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(retrieved.title, "first post");
    assert_eq!(retrieved.view_count, 0);

    let updated = db
        .update_post(
            &post.id,
            "edited title",
            "edited body",
            "info",
            Some("https://images.example.com/a.webp"),
            Some("medium"),
            Some("center"),
        )
        .await
        .unwrap();
    assert!(updated);
    let retrieved = db.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(retrieved.title, "edited title");
    assert_eq!(retrieved.category, "info");

    db.delete_post(&post.id).await.unwrap();
    assert!(db.get_post(&post.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_posts_filters_by_category() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_post(&sample_post("q", "question")).await.unwrap();
    db.insert_post(&sample_post("i", "info")).await.unwrap();

    let all = db.list_posts(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let questions = db.list_posts(Some("question")).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].title, "q");
}

#[tokio::test]
async fn test_atomic_view_increment() {
    let (db, _temp_dir) = create_test_db().await;

    let post = sample_post("viewed", "question");
    db.insert_post(&post).await.unwrap();

    assert!(db.increment_view_count(&post.id).await.unwrap());
    assert!(db.increment_view_count(&post.id).await.unwrap());
    assert_eq!(db.get_view_count(&post.id).await.unwrap(), Some(2));

    // Unknown post increments no rows.
    assert!(!db.increment_view_count("missing").await.unwrap());
}

#[tokio::test]
async fn test_comment_insert_and_count() {
    let (db, _temp_dir) = create_test_db().await;

    let post = sample_post("commented", "question");
    db.insert_post(&post).await.unwrap();

    let comment = Comment {
        id: EntityId::new().0,
        post_id: post.id.clone(),
        user_id: "user-1".to_string(),
        nickname: "alice".to_string(),
        content: "first!".to_string(),
        created_at: Utc::now(),
    };
    db.insert_comment(&comment).await.unwrap();

    assert_eq!(db.count_comments(&post.id).await.unwrap(), 1);
    let comments = db.get_comments_for_post(&post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, "first!");

    db.delete_comment(&comment.id).await.unwrap();
    assert_eq!(db.count_comments(&post.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_deleting_post_leaves_comments_behind() {
    let (db, _temp_dir) = create_test_db().await;

    let post = sample_post("doomed", "question");
    db.insert_post(&post).await.unwrap();

    let comment = Comment {
        id: EntityId::new().0,
        post_id: post.id.clone(),
        user_id: "user-1".to_string(),
        nickname: "alice".to_string(),
        content: "orphan-to-be".to_string(),
        created_at: Utc::now(),
    };
    db.insert_comment(&comment).await.unwrap();

    db.delete_post(&post.id).await.unwrap();

    assert!(db.get_post(&post.id).await.unwrap().is_none());
    // No cascade: the comment row survives its post.
    assert!(db.get_comment(&comment.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_profile_patch_and_avatar() {
    let (db, _temp_dir) = create_test_db().await;

    let user = sample_user("a@example.com");
    db.insert_user_with_profile(&user, &sample_profile(&user, "alice"))
        .await
        .unwrap();

    let patched = db
        .patch_profile(&user.id, Some("Alice"), Some("010-1234-5678"), None)
        .await
        .unwrap();
    assert!(patched);

    let profile = db.get_profile(&user.id).await.unwrap().unwrap();
    assert_eq!(profile.nickname, "Alice");
    assert_eq!(profile.phone.as_deref(), Some("010-1234-5678"));

    let updated = db
        .update_profile_avatar(&user.id, "https://avatars.example.com/a.webp")
        .await
        .unwrap();
    assert!(updated);
    let profile = db.get_profile(&user.id).await.unwrap().unwrap();
    assert_eq!(
        profile.avatar_url.as_deref(),
        Some("https://avatars.example.com/a.webp")
    );
}

#[tokio::test]
async fn test_reviews_listed_newest_first() {
    let (db, _temp_dir) = create_test_db().await;

    let older = Review {
        id: EntityId::new().0,
        nickname: "anon".to_string(),
        content: "decent".to_string(),
        created_at: Utc::now() - chrono::Duration::minutes(5),
    };
    let newer = Review {
        id: EntityId::new().0,
        nickname: "anon2".to_string(),
        content: "great".to_string(),
        created_at: Utc::now(),
    };
    db.insert_review(&older).await.unwrap();
    db.insert_review(&newer).await.unwrap();

    let reviews = db.list_reviews().await.unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].content, "great");
    assert_eq!(reviews[1].content, "decent");
}
