use blog_server::entity::blog_post;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn slugs(posts: &Value) -> Vec<&str> {
    posts
        .as_array()
        .expect("posts array")
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect()
}

async fn publish(app: &TestApp, token: &str, id: i32) {
    let res = app
        .patch_with_token(&routes::post(id), &json!({"published": true}), token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn index_groups_published_posts_by_category() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let news = app.create_category(&token, "news").await;
    let guides = app.create_category(&token, "guides").await;
    app.create_category(&token, "empty").await;

    app.create_post(
        &token,
        json!({"category_id": news, "title": "Launch", "slug": "launch", "featured": true, "published": true}),
    )
    .await;
    let howto = app
        .create_post(&token, json!({"category_id": guides, "title": "How to", "slug": "how-to"}))
        .await;
    app.create_post(&token, json!({"category_id": news, "title": "Draft", "slug": "draft"}))
        .await;
    publish(&app, &token, howto).await;

    let res = app.get_without_token(routes::BLOG).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(slugs(&res.body["featured"]), vec!["launch"]);
    let sections = res.body["sections"].as_array().unwrap();
    let names: Vec<&str> = sections
        .iter()
        .map(|s| s["category"]["slug"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["news", "guides"]);
    assert_eq!(slugs(&sections[0]["posts"]), vec!["launch"]);
    assert_eq!(slugs(&sections[1]["posts"]), vec!["how-to"]);
}

#[tokio::test]
async fn sections_follow_category_order() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let news = app.create_category(&token, "news").await;
    let guides = app.create_category(&token, "guides").await;
    for (category, slug) in [(news, "a"), (guides, "b")] {
        app.create_post(
            &token,
            json!({"category_id": category, "title": slug, "slug": slug, "published": true}),
        )
        .await;
    }

    let res = app
        .put_with_token(
            routes::CATEGORIES_REORDER,
            &json!({"category_ids": [guides, news]}),
            &token,
        )
        .await;
    assert_eq!(res.body["outcome"], "reordered");

    let res = app.get_without_token(routes::BLOG).await;
    assert_eq!(res.body["sections"][0]["category"]["slug"], "guides");
    assert_eq!(res.body["sections"][1]["category"]["slug"], "news");

    let res = app.get_without_token(routes::BLOG_CATEGORIES).await;
    assert_eq!(res.body["categories"][0]["slug"], "guides");
}

#[tokio::test]
async fn category_page_lists_only_published_posts() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let news = app.create_category(&token, "news").await;
    app.create_post(
        &token,
        json!({"category_id": news, "title": "Out", "slug": "out", "published": true}),
    )
    .await;
    let scheduled = app
        .create_post(
            &token,
            json!({"category_id": news, "title": "Later", "slug": "later", "published": true}),
        )
        .await;
    app.create_post(&token, json!({"category_id": news, "title": "Draft", "slug": "draft"}))
        .await;

    let post = blog_post::Entity::find_by_id(scheduled)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let mut post: blog_post::ActiveModel = post.into();
    post.published_at = Set(Some(Utc::now() + Duration::days(1)));
    post.update(&app.db).await.unwrap();

    let res = app.get_without_token(&routes::blog_category("news")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["category"]["slug"], "news");
    assert_eq!(slugs(&res.body["posts"]), vec!["out"]);
    assert_eq!(
        app.get_without_token(&routes::blog_post("news", "later"))
            .await
            .status,
        404
    );
}

#[tokio::test]
async fn post_page_renders_sanitized_html() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let news = app.create_category(&token, "news").await;
    app.create_post(
        &token,
        json!({
            "category_id": news,
            "title": "Hello",
            "slug": "hello",
            "content": "**bold**<script>alert(1)</script>",
            "published": true
        }),
    )
    .await;

    let res = app.get_without_token(&routes::blog_post("news", "hello")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["title"], "Hello");
    assert_eq!(res.body["category"]["slug"], "news");
    let html = res.body["html"].as_str().unwrap();
    assert!(html.contains("<strong>bold</strong>"), "{html}");
    assert!(!html.contains("script"), "{html}");
}

#[tokio::test]
async fn unpublished_or_misplaced_posts_are_not_found() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let news = app.create_category(&token, "news").await;
    app.create_category(&token, "guides").await;
    app.create_post(&token, json!({"category_id": news, "title": "Draft", "slug": "draft"}))
        .await;
    app.create_post(
        &token,
        json!({"category_id": news, "title": "Out", "slug": "out", "published": true}),
    )
    .await;

    for path in [
        routes::blog_post("news", "draft"),
        routes::blog_post("guides", "out"),
        routes::blog_post("missing", "out"),
        routes::blog_category("missing"),
    ] {
        assert_eq!(app.get_without_token(&path).await.status, 404, "{path}");
    }
}
