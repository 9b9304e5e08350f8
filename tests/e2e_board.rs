//! Community board E2E tests

mod common;

use common::TestServer;

async fn create_post(
    server: &TestServer,
    token: &str,
    title: &str,
    category: &str,
) -> serde_json::Value {
    let response = server
        .client
        .post(server.url("/api/posts"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "text_before": "body text",
            "category": category,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200, "create_post failed for {title}");
    response.json().await.unwrap()
}

#[tokio::test]
async fn post_creation_requires_authentication() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/posts"))
        .json(&serde_json::json!({
            "title": "no session",
            "text_before": "body",
            "category": "question",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn post_flow_with_view_like_and_comment_counters() {
    let server = TestServer::new().await;
    let (token, _) = server.signup("a@example.com", "alice").await;

    let post = create_post(&server, &token, "counting", "question").await;
    let post_id = post["id"].as_str().unwrap();
    assert_eq!(post["nickname"], "alice");
    assert_eq!(post["view_count"], 0);

    // Detail load bumps the view count before reading.
    let detail: serde_json::Value = server
        .client
        .get(server.url(&format!("/api/posts/{post_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["post"]["view_count"], 1);

    // Like returns the optimistic value.
    let liked: serde_json::Value = server
        .client
        .post(server.url(&format!("/api/posts/{post_id}/like")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(liked["like_count"], 1);

    // Comment insert returns the refreshed detail with a recounted total.
    let commented: serde_json::Value = server
        .client
        .post(server.url(&format!("/api/posts/{post_id}/comments")))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "first!" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(commented["post"]["comment_count"], 1);
    assert_eq!(commented["comments"][0]["content"], "first!");
    assert_eq!(commented["comments"][0]["nickname"], "alice");
}

#[tokio::test]
async fn comments_require_authentication_and_reject_guests() {
    let server = TestServer::new().await;
    let (token, _) = server.signup("a@example.com", "alice").await;
    let post = create_post(&server, &token, "quiet", "question").await;
    let post_id = post["id"].as_str().unwrap();

    let anonymous = server
        .client
        .post(server.url(&format!("/api/posts/{post_id}/comments")))
        .json(&serde_json::json!({ "content": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 401);

    let guest: serde_json::Value = server
        .client
        .post(server.url("/api/auth/guest"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let guest_token = guest["token"].as_str().unwrap();
    let as_guest = server
        .client
        .post(server.url(&format!("/api/posts/{post_id}/comments")))
        .bearer_auth(guest_token)
        .json(&serde_json::json!({ "content": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(as_guest.status(), 401);
}

#[tokio::test]
async fn notice_posts_sort_first_for_every_sort_key() {
    let server = TestServer::new().await;
    let (admin_token, _) = server.signup_admin().await;
    let (token, _) = server.signup("a@example.com", "alice").await;

    // Notice is created first (oldest) by the admin.
    let notice = create_post(&server, &admin_token, "maintenance notice", "notice").await;
    assert_eq!(notice["nickname"], "Modam Admin");
    let notice_id = notice["id"].as_str().unwrap();

    let popular = create_post(&server, &token, "popular question", "question").await;
    let popular_id = popular["id"].as_str().unwrap();
    // Give the ordinary post strictly better numbers on every key.
    for _ in 0..3 {
        server
            .client
            .post(server.url(&format!("/api/posts/{popular_id}/like")))
            .send()
            .await
            .unwrap();
        server
            .client
            .get(server.url(&format!("/api/posts/{popular_id}")))
            .send()
            .await
            .unwrap();
    }
    server
        .client
        .post(server.url(&format!("/api/posts/{popular_id}/comments")))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "bump" }))
        .send()
        .await
        .unwrap();

    for sort in ["newest", "views", "likes", "comments"] {
        let listed: serde_json::Value = server
            .client
            .get(server.url(&format!("/api/posts?sort={sort}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            listed[0]["id"],
            notice_id,
            "notice must sort first under {sort}"
        );
    }
}

#[tokio::test]
async fn non_admins_cannot_create_notices_or_delete_posts() {
    let server = TestServer::new().await;
    let (token, _) = server.signup("a@example.com", "alice").await;

    let forbidden_notice = server
        .client
        .post(server.url("/api/posts"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "fake notice",
            "text_before": "body",
            "category": "notice",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden_notice.status(), 403);

    let post = create_post(&server, &token, "mine", "question").await;
    let post_id = post["id"].as_str().unwrap();

    let forbidden_delete = server
        .client
        .delete(server.url(&format!("/api/posts/{post_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden_delete.status(), 403);
}

#[tokio::test]
async fn admin_can_edit_and_delete_posts() {
    let server = TestServer::new().await;
    let (admin_token, _) = server.signup_admin().await;
    let (token, _) = server.signup("a@example.com", "alice").await;

    let post = create_post(&server, &token, "editable", "question").await;
    let post_id = post["id"].as_str().unwrap();

    let edited: serde_json::Value = server
        .client
        .patch(server.url(&format!("/api/posts/{post_id}")))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "title": "edited title",
            "content": "edited body",
            "category": "info",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(edited["title"], "edited title");
    assert_eq!(edited["category"], "info");

    let deleted = server
        .client
        .delete(server.url(&format!("/api/posts/{post_id}")))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    // Gone from subsequent list fetches.
    let listed: serde_json::Value = server
        .client
        .get(server.url("/api/posts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.as_array().unwrap().is_empty());

    // Detail fetch of a deleted post is a 404.
    let missing = server
        .client
        .get(server.url(&format!("/api/posts/{post_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn category_filter_and_invalid_params() {
    let server = TestServer::new().await;
    let (token, _) = server.signup("a@example.com", "alice").await;

    create_post(&server, &token, "a question", "question").await;
    create_post(&server, &token, "a story", "experience").await;

    let questions: serde_json::Value = server
        .client
        .get(server.url("/api/posts?category=question"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(questions.as_array().unwrap().len(), 1);
    assert_eq!(questions[0]["title"], "a question");

    let bad_category = server
        .client
        .get(server.url("/api/posts?category=general"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_category.status(), 400);

    let bad_sort = server
        .client
        .get(server.url("/api/posts?sort=oldest"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_sort.status(), 400);
}

#[tokio::test]
async fn reviews_round_trip() {
    let server = TestServer::new().await;

    let created = server
        .client
        .post(server.url("/api/reviews"))
        .json(&serde_json::json!({
            "nickname": "anon",
            "content": "simple and quick",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 200);

    let too_long = server
        .client
        .post(server.url("/api/reviews"))
        .json(&serde_json::json!({
            "nickname": "anon",
            "content": "x".repeat(81),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_long.status(), 400);

    let listed: serde_json::Value = server
        .client
        .get(server.url("/api/reviews"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["content"], "simple and quick");
}
