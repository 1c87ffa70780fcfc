//! Handler tests against an in-memory database

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use chrono::{Duration, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use super::{build_router, AppState};
use crate::config::Config;
use crate::db::{create_test_pool, migrations};
use crate::models::{CreateCategoryInput, CreatePostInput, PageSelector, Post, User};
use crate::services::RegisterInput;

struct TestApp {
    server: TestServer,
    state: AppState,
    media: TempDir,
}

async fn setup() -> TestApp {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let media = TempDir::new().unwrap();
    let mut config = Config::default();
    config.upload.path = media.path().to_path_buf();

    let state = AppState::new(pool, &config);
    let server = TestServer::new(build_router(state.clone(), &config.server.cors_origin)).unwrap();

    TestApp {
        server,
        state,
        media,
    }
}

impl TestApp {
    /// Register a user and open a session, returning the user and token
    async fn user(&self, username: &str) -> (User, String) {
        let user = self
            .state
            .user_service
            .register(RegisterInput::new(username, "", "password123"))
            .await
            .unwrap();
        let session = self.state.user_service.start_session(user.id).await.unwrap();
        (user, session.id)
    }

    async fn category(&self, slug: &str, is_published: bool) -> i64 {
        self.state
            .category_service
            .create(CreateCategoryInput {
                title: slug.to_string(),
                description: String::new(),
                slug: Some(slug.to_string()),
                is_published,
            })
            .await
            .unwrap()
            .id
    }

    async fn post(&self, author: &User, title: &str, is_published: bool, category: i64) -> Post {
        self.post_at(author, title, is_published, category, Utc::now() - Duration::hours(1))
            .await
    }

    async fn post_at(
        &self,
        author: &User,
        title: &str,
        is_published: bool,
        category: i64,
        pub_date: chrono::DateTime<Utc>,
    ) -> Post {
        self.state
            .post_service
            .create(
                author.id,
                CreatePostInput {
                    title: title.to_string(),
                    text: "Body".to_string(),
                    pub_date: Some(pub_date),
                    image: None,
                    is_published,
                    location_id: None,
                    category_id: Some(category),
                },
            )
            .await
            .unwrap()
    }
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn titles(page: &Value) -> Vec<String> {
    page["page_obj"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

fn post_form(title: &str, category: i64) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title)
        .add_text("text", "Some text")
        .add_text("pub_date", "")
        .add_text("category", category.to_string())
        .add_text("is_published", "on")
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn test_index_lists_only_published_posts() {
    let app = setup().await;
    let (author, _) = app.user("author").await;
    let open = app.category("open", true).await;
    let hidden = app.category("hidden", false).await;

    app.post(&author, "visible", true, open).await;
    app.post(&author, "draft", false, open).await;
    app.post(&author, "in hidden category", true, hidden).await;
    app.post_at(&author, "scheduled", true, open, Utc::now() + Duration::days(1))
        .await;

    let response = app.server.get("/").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(titles(&body), vec!["visible"]);
    assert_eq!(body["page_obj"]["count"], 1);
    assert_eq!(body["page_obj"]["items"][0]["comment_count"], 0);
}

#[tokio::test]
async fn test_index_pagination() {
    let app = setup().await;
    let (author, _) = app.user("author").await;
    let open = app.category("open", true).await;
    for i in 0..12 {
        app.post_at(&author, &format!("post {:02}", i), true, open, Utc::now() - Duration::minutes(i + 1))
            .await;
    }

    let first: Value = app.server.get("/").await.json();
    assert_eq!(first["page_obj"]["items"].as_array().unwrap().len(), 10);
    assert_eq!(first["page_obj"]["has_next"], true);
    // Newest first
    assert_eq!(titles(&first)[0], "post 00");

    let last: Value = app.server.get("/").add_query_param("page", "last").await.json();
    assert_eq!(last["page_obj"]["number"], 2);
    assert_eq!(titles(&last), vec!["post 10", "post 11"]);

    app.server
        .get("/")
        .add_query_param("page", "3")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get("/")
        .add_query_param("page", "abc")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_page() {
    let app = setup().await;
    let (author, _) = app.user("author").await;
    let travel = app.category("travel", true).await;
    let food = app.category("food", true).await;
    app.category("secret", false).await;

    app.post(&author, "trip", true, travel).await;
    app.post(&author, "soup", true, food).await;

    let body: Value = app.server.get("/category/travel/").await.json();
    assert_eq!(body["category"]["slug"], "travel");
    assert_eq!(titles(&body), vec!["trip"]);

    app.server
        .get("/category/secret/")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get("/category/missing/")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_shows_owner_all_posts() {
    let app = setup().await;
    let (author, author_token) = app.user("author").await;
    let (_, reader_token) = app.user("reader").await;
    let open = app.category("open", true).await;

    app.post(&author, "public", true, open).await;
    app.post(&author, "draft", false, open).await;

    let own: Value = app
        .server
        .get("/profile/author/")
        .add_header(header::AUTHORIZATION, bearer(&author_token))
        .await
        .json();
    assert_eq!(own["profile"]["username"], "author");
    assert_eq!(own["page_obj"]["count"], 2);
    assert!(own["profile"].get("password_hash").is_none());

    let other: Value = app
        .server
        .get("/profile/author/")
        .add_header(header::AUTHORIZATION, bearer(&reader_token))
        .await
        .json();
    assert_eq!(titles(&other), vec!["public"]);

    let anonymous: Value = app.server.get("/profile/author/").await.json();
    assert_eq!(titles(&anonymous), vec!["public"]);

    app.server
        .get("/profile/nobody/")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Post detail and mutations
// ============================================================================

#[tokio::test]
async fn test_detail_hides_drafts_from_others() {
    let app = setup().await;
    let (author, author_token) = app.user("author").await;
    let (_, reader_token) = app.user("reader").await;
    let open = app.category("open", true).await;
    let draft = app.post(&author, "draft", false, open).await;
    let url = format!("/posts/{}/", draft.id);

    app.server.get(&url).await.assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&url)
        .add_header(header::AUTHORIZATION, bearer(&reader_token))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .get(&url)
        .add_header(header::AUTHORIZATION, bearer(&author_token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["post"]["title"], "draft");
    assert_eq!(body["form"]["text"], "");
    assert_eq!(body["comments"], serde_json::json!([]));
}

#[tokio::test]
async fn test_create_requires_login() {
    let app = setup().await;

    let response = app.server.get("/posts/create/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/?next=%2Fposts%2Fcreate%2F");
}

#[tokio::test]
async fn test_create_post_sets_author_and_redirects_to_profile() {
    let app = setup().await;
    let (author, token) = app.user("author").await;
    let open = app.category("open", true).await;

    let form_page: Value = app
        .server
        .get("/posts/create/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(form_page["categories"][0]["slug"], "open");

    let response = app
        .server
        .post("/posts/create/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(post_form("Fresh", open).add_text("author", "999"))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/author/");

    let posts = app
        .state
        .post_service
        .list_for_profile(author.id, Some(author.id), PageSelector::default())
        .await
        .unwrap();
    assert_eq!(posts.total, 1);
    assert_eq!(posts.items[0].title, "Fresh");
    assert_eq!(posts.items[0].author_id, author.id);
    assert!(posts.items[0].is_published);
}

#[tokio::test]
async fn test_create_post_validation_errors() {
    let app = setup().await;
    let (_, token) = app.user("author").await;

    let response = app
        .server
        .post("/posts/create/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(
            MultipartForm::new()
                .add_text("title", "")
                .add_text("text", "body")
                .add_text("pub_date", "not a date"),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["errors"]["pub_date"].is_array());
}

#[tokio::test]
async fn test_unchecked_checkbox_saves_draft() {
    let app = setup().await;
    let (author, token) = app.user("author").await;
    let open = app.category("open", true).await;

    app.server
        .post("/posts/create/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(
            MultipartForm::new()
                .add_text("title", "Quiet")
                .add_text("text", "Not yet")
                .add_text("category", open.to_string())
                .add_text("is_published", "off"),
        )
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let posts = app
        .state
        .post_service
        .list_for_profile(author.id, Some(author.id), PageSelector::default())
        .await
        .unwrap();
    assert!(!posts.items[0].is_published);
}

#[tokio::test]
async fn test_omitted_publish_flag_publishes_and_then_keeps() {
    let app = setup().await;
    let (author, token) = app.user("author").await;
    let open = app.category("open", true).await;
    let bare_form = |title: &str| {
        MultipartForm::new()
            .add_text("title", title)
            .add_text("text", "Plain")
            .add_text("category", open.to_string())
    };

    app.server
        .post("/posts/create/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(bare_form("Live"))
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let posts = app
        .state
        .post_service
        .list_for_profile(author.id, Some(author.id), PageSelector::default())
        .await
        .unwrap();
    assert!(posts.items[0].is_published);
    let post_id = posts.items[0].id;

    app.server
        .post(&format!("/posts/{}/edit/", post_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(bare_form("Still live"))
        .await
        .assert_status(StatusCode::SEE_OTHER);

    assert!(app.state.post_service.get(post_id).await.unwrap().is_published);
    let index: Value = app.server.get("/").await.json();
    assert_eq!(titles(&index), vec!["Still live"]);

    // An explicit unchecked value still takes the post down
    app.server
        .post(&format!("/posts/{}/edit/", post_id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(bare_form("Hidden").add_text("is_published", "off"))
        .await
        .assert_status(StatusCode::SEE_OTHER);
    assert!(!app.state.post_service.get(post_id).await.unwrap().is_published);
}

#[tokio::test]
async fn test_create_rejects_non_multipart_body() {
    let app = setup().await;
    let (_, token) = app.user("author").await;

    let response = app
        .server
        .post("/posts/create/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&serde_json::json!({ "title": "Wrong encoding" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unparseable_ids_are_not_found() {
    let app = setup().await;
    let (author, token) = app.user("author").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "real", true, open).await;

    for path in [
        "/posts/abc/".to_string(),
        "/posts/99999999999999999999/".to_string(),
        "/posts/abc/edit/".to_string(),
        format!("/posts/{}/edit_comment/abc/", post.id),
    ] {
        let response = app
            .server
            .get(&path)
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "NOT_FOUND", "{}", path);
    }
}

#[tokio::test]
async fn test_non_author_edit_and_delete_redirect_to_post() {
    let app = setup().await;
    let (author, _) = app.user("author").await;
    let (_, reader_token) = app.user("reader").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "original", true, open).await;
    let detail = format!("/posts/{}/", post.id);

    let response = app
        .server
        .post(&format!("/posts/{}/edit/", post.id))
        .add_header(header::AUTHORIZATION, bearer(&reader_token))
        .multipart(post_form("hijacked", open))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let response = app.server.get(&format!("/posts/{}/edit/", post.id)).await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let response = app
        .server
        .post(&format!("/posts/{}/delete/", post.id))
        .add_header(header::AUTHORIZATION, bearer(&reader_token))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let unchanged = app.state.post_service.get(post.id).await.unwrap();
    assert_eq!(unchanged.title, "original");
}

#[tokio::test]
async fn test_author_edits_post() {
    let app = setup().await;
    let (author, token) = app.user("author").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "before", true, open).await;
    let stored = app.state.post_service.get(post.id).await.unwrap();

    let form_page: Value = app
        .server
        .get(&format!("/posts/{}/edit/", post.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(form_page["post"]["title"], "before");

    let response = app
        .server
        .post(&format!("/posts/{}/edit/", post.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(post_form("after", open))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));

    let updated = app.state.post_service.get(post.id).await.unwrap();
    assert_eq!(updated.title, "after");
    // Blank pub_date keeps the stored one
    assert_eq!(updated.pub_date, stored.pub_date);
}

#[tokio::test]
async fn test_author_deletes_post_with_comments() {
    let app = setup().await;
    let (author, token) = app.user("author").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "doomed", true, open).await;
    app.state
        .comment_service
        .create(post.id, author.id, "first")
        .await
        .unwrap();

    let confirm: Value = app
        .server
        .get(&format!("/posts/{}/delete/", post.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(confirm["post"]["title"], "doomed");

    let response = app
        .server
        .post(&format!("/posts/{}/delete/", post.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    assert!(app.state.post_service.get(post.id).await.is_err());
    assert!(app
        .state
        .comment_service
        .list_for_post(post.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_image_upload_and_removal() {
    let app = setup().await;
    let (author, token) = app.user("author").await;
    let open = app.category("open", true).await;

    let image = Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("photo.png")
        .mime_type("image/png");
    app.server
        .post("/posts/create/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(post_form("With image", open).add_part("image", image))
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let posts = app
        .state
        .post_service
        .list_for_profile(author.id, Some(author.id), PageSelector::default())
        .await
        .unwrap();
    let post = &posts.items[0];
    let relative = post.image.clone().expect("image stored");
    assert!(relative.starts_with("post_images/"));
    let stored = app.media.path().join(&relative);
    assert!(stored.exists());

    app.server
        .get(&format!("/media/{}", relative))
        .await
        .assert_status_ok();

    app.server
        .post(&format!("/posts/{}/delete/", post.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::SEE_OTHER);
    assert!(!stored.exists());
}

#[tokio::test]
async fn test_rejected_image_type() {
    let app = setup().await;
    let (_, token) = app.user("author").await;
    let open = app.category("open", true).await;

    let script = Part::text("alert(1)")
        .file_name("x.js")
        .mime_type("text/javascript");
    let response = app
        .server
        .post("/posts/create/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .multipart(post_form("Bad image", open).add_part("image", script))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"]["details"]["errors"]["image"].is_array());
}

// ============================================================================
// Comments
// ============================================================================

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = setup().await;
    let (author, author_token) = app.user("author").await;
    let (_, reader_token) = app.user("reader").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "talk", true, open).await;
    let detail = format!("/posts/{}/", post.id);

    let response = app
        .server
        .post(&format!("/posts/{}/comment/", post.id))
        .add_header(header::AUTHORIZATION, bearer(&author_token))
        .form(&[("text", "First!")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let body: Value = app.server.get(&detail).await.json();
    assert_eq!(body["comments"][0]["text"], "First!");
    assert_eq!(body["comments"][0]["author_username"], "author");
    let comment_id = body["comments"][0]["id"].as_i64().unwrap();
    let edit_url = format!("/posts/{}/edit_comment/{}/", post.id, comment_id);

    // Someone else may not touch it
    app.server
        .post(&edit_url)
        .add_header(header::AUTHORIZATION, bearer(&reader_token))
        .form(&[("text", "Mine now")])
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .post(&edit_url)
        .add_header(header::AUTHORIZATION, bearer(&author_token))
        .form(&[("text", "Edited")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let response = app
        .server
        .post(&format!("/posts/{}/delete_comment/{}/", post.id, comment_id))
        .add_header(header::AUTHORIZATION, bearer(&author_token))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let body: Value = app.server.get(&detail).await.json();
    assert_eq!(body["comments"], serde_json::json!([]));
}

#[tokio::test]
async fn test_comments_listed_oldest_first() {
    let app = setup().await;
    let (author, _) = app.user("author").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "talk", true, open).await;
    for text in ["one", "two", "three"] {
        app.state
            .comment_service
            .create(post.id, author.id, text)
            .await
            .unwrap();
    }

    let body: Value = app.server.get(&format!("/posts/{}/", post.id)).await.json();
    let texts: Vec<&str> = body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(body["post"]["comment_count"], 3);
}

#[tokio::test]
async fn test_comment_rules() {
    let app = setup().await;
    let (author, author_token) = app.user("author").await;
    let (_, reader_token) = app.user("reader").await;
    let open = app.category("open", true).await;
    let draft = app.post(&author, "draft", false, open).await;
    let other = app.post(&author, "other", true, open).await;

    // Anonymous users are sent to login
    let response = app
        .server
        .post(&format!("/posts/{}/comment/", other.id))
        .form(&[("text", "hi")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/?next="));

    // Hidden posts take no comments
    app.server
        .post(&format!("/posts/{}/comment/", draft.id))
        .add_header(header::AUTHORIZATION, bearer(&reader_token))
        .form(&[("text", "hi")])
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Blank text is a validation error
    app.server
        .post(&format!("/posts/{}/comment/", other.id))
        .add_header(header::AUTHORIZATION, bearer(&reader_token))
        .form(&[("text", "  ")])
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // A comment addressed through the wrong post does not exist
    let comment = app
        .state
        .comment_service
        .create(other.id, author.id, "here")
        .await
        .unwrap();
    app.server
        .get(&format!("/posts/{}/edit_comment/{}/", draft.id, comment.id))
        .add_header(header::AUTHORIZATION, bearer(&author_token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Profiles and auth
// ============================================================================

#[tokio::test]
async fn test_profile_edit() {
    let app = setup().await;
    let (_, owner_token) = app.user("owner").await;
    let (_, intruder_token) = app.user("intruder").await;

    let form = [
        ("username", "owner"),
        ("email", "owner@example.com"),
        ("first_name", "Olga"),
        ("last_name", "Owner"),
    ];

    app.server
        .post("/profile/owner/edit/")
        .add_header(header::AUTHORIZATION, bearer(&intruder_token))
        .form(&form)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .post("/profile/owner/edit/")
        .add_header(header::AUTHORIZATION, bearer(&owner_token))
        .form(&form)
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let updated = app.state.user_service.get_by_username("owner").await.unwrap();
    assert_eq!(updated.first_name, "Olga");
    assert_eq!(updated.email, "owner@example.com");
}

#[tokio::test]
async fn test_login_sets_cookie_and_follows_next() {
    let app = setup().await;
    app.user("author").await;

    let response = app
        .server
        .post("/auth/login/")
        .add_query_param("next", "/posts/create/")
        .form(&[("username", "author"), ("password", "password123")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/posts/create/");

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    // The cookie alone authenticates
    let session = cookie.split(';').next().unwrap().to_string();
    app.server
        .get("/posts/create/")
        .add_header(header::COOKIE, HeaderValue::from_str(&session).unwrap())
        .await
        .assert_status_ok();

    app.server
        .post("/auth/login/")
        .form(&[("username", "author"), ("password", "wrong-password")])
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_and_logout() {
    let app = setup().await;

    let response = app
        .server
        .post("/auth/signup/")
        .form(&[
            ("username", "newcomer"),
            ("email", "new@example.com"),
            ("password", "long-enough"),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/newcomer/");

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let token = cookie
        .split(';')
        .next()
        .and_then(|c| c.strip_prefix("session="))
        .unwrap()
        .to_string();

    let response = app
        .server
        .post("/auth/logout/")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(app
        .state
        .user_service
        .validate_session(&token)
        .await
        .unwrap()
        .is_none());

    app.server
        .post("/auth/signup/")
        .form(&[("username", "newcomer"), ("password", "long-enough")])
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Router
// ============================================================================

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = setup().await;
    let router = build_router(app.state.clone(), "http://blog.example");

    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "http://blog.example")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://blog.example"
    );
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_invalid_cors_origin_disables_cors() {
    let app = setup().await;
    let router = build_router(app.state.clone(), "not\na valid header");

    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "http://blog.example")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
