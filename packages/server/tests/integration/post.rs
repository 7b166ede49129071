use blog_server::entity::blog_post_file;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use crate::common::{TestApp, images, routes};

fn referenced(body: &Value) -> Vec<i64> {
    body["referenced_file_ids"]
        .as_array()
        .expect("referenced_file_ids array")
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

mod references {
    use super::*;

    #[tokio::test]
    async fn images_linked_on_this_host_are_recorded() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;
        let photo = app.upload_image("photo.png", images::png("photo"), &token).await;
        let other = app.upload_image("other.png", images::png("other"), &token).await;

        let content = format!(
            "![photo](/media/images/photo.png)\n\n\
             ![again](http://{}/media/images/other.png)\n\n\
             ![elsewhere](https://cdn.example.net/media/images/photo.png)\n",
            app.addr
        );
        let res = app
            .post_with_token(
                routes::POSTS,
                &json!({"category_id": category, "title": "Photos", "slug": "photos", "content": content}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let mut expected = vec![
            photo.body["file_id"].as_i64().unwrap(),
            other.body["file_id"].as_i64().unwrap(),
        ];
        expected.sort();
        assert_eq!(referenced(&res.body), expected);
    }

    #[tokio::test]
    async fn editing_content_replaces_references() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;
        let photo = app.upload_image("photo.png", images::png("photo"), &token).await;
        let photo_id = photo.body["file_id"].as_i64().unwrap();

        let id = app
            .create_post(
                &token,
                json!({"category_id": category, "title": "T", "slug": "t", "content": "![p](/media/images/photo.png)"}),
            )
            .await;
        let res = app.get_with_token(&routes::post(id), &token).await;
        assert_eq!(referenced(&res.body), vec![photo_id]);

        let res = app
            .patch_with_token(&routes::post(id), &json!({"title": "Renamed"}), &token)
            .await;
        assert_eq!(referenced(&res.body), vec![photo_id]);

        let res = app
            .patch_with_token(&routes::post(id), &json!({"content": "No images now."}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(referenced(&res.body).is_empty());
    }

    #[tokio::test]
    async fn deleting_a_post_drops_its_references() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;
        app.upload_image("photo.png", images::png("photo"), &token).await;
        let id = app
            .create_post(
                &token,
                json!({"category_id": category, "title": "T", "slug": "t", "content": "[p]: /media/images/photo.png"}),
            )
            .await;
        assert_eq!(blog_post_file::Entity::find().count(&app.db).await.unwrap(), 1);

        let res = app.delete_with_token(&routes::post(id), &token).await;

        assert_eq!(res.status, 204);
        assert_eq!(blog_post_file::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(app.get_with_token(&routes::post(id), &token).await.status, 404);
        assert_eq!(app.stored_files("images"), vec!["photo.png"]);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn content_is_rendered_and_sanitized() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;

        let res = app
            .post_with_token(
                routes::POSTS,
                &json!({
                    "category_id": category,
                    "title": "Hello",
                    "slug": "hello",
                    "content": "# Hi\n\n<span onclick=\"x()\">see https://example.com</span>"
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let html = res.body["rendered_content"].as_str().unwrap();
        assert!(html.contains("<h1>Hi</h1>"), "{html}");
        assert!(html.contains("href=\"https://example.com\""), "{html}");
        assert!(!html.contains("onclick"), "{html}");
        assert!(res.body["published_at"].is_null());
    }

    #[tokio::test]
    async fn publishing_stamps_time_once() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;
        let id = app
            .create_post(&token, json!({"category_id": category, "title": "T", "slug": "t"}))
            .await;

        let first = app
            .patch_with_token(&routes::post(id), &json!({"published": true}), &token)
            .await;
        assert!(first.body["published_at"].is_string(), "{}", first.text);
        let stamped = app.get_with_token(&routes::post(id), &token).await.body["published_at"].clone();

        app.patch_with_token(&routes::post(id), &json!({"published": true}), &token)
            .await;
        let again = app.get_with_token(&routes::post(id), &token).await;
        assert_eq!(again.body["published_at"], stamped);

        let unpublished = app
            .patch_with_token(&routes::post(id), &json!({"published": false}), &token)
            .await;
        assert!(unpublished.body["published_at"].is_null());
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;
        app.create_post(&token, json!({"category_id": category, "title": "T", "slug": "t"}))
            .await;

        let res = app
            .post_with_token(
                routes::POSTS,
                &json!({"category_id": category, "title": "Other", "slug": "t"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn unknown_category_or_header_image_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;

        for body in [
            json!({"category_id": 999, "title": "T", "slug": "t"}),
            json!({"category_id": category, "title": "T", "slug": "t", "header_image_file_id": 999}),
            json!({"category_id": category, "title": "", "slug": "t"}),
        ] {
            let res = app.post_with_token(routes::POSTS, &body, &token).await;
            assert_eq!(res.status, 400, "{body}");
        }
    }

    #[tokio::test]
    async fn header_image_can_be_set_and_cleared() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;
        let image = app.upload_image("head.png", images::png("head"), &token).await;
        let id = app
            .create_post(&token, json!({"category_id": category, "title": "T", "slug": "t"}))
            .await;

        let res = app
            .patch_with_token(
                &routes::post(id),
                &json!({"header_image_file_id": image.body["file_id"]}),
                &token,
            )
            .await;
        assert_eq!(res.body["header_image_file_id"], image.body["file_id"]);

        let res = app
            .patch_with_token(&routes::post(id), &json!({"header_image_file_id": null}), &token)
            .await;
        assert!(res.body["header_image_file_id"].is_null());
    }

    #[tokio::test]
    async fn list_shows_newest_first() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category = app.create_category(&token, "news").await;
        let first = app
            .create_post(&token, json!({"category_id": category, "title": "One", "slug": "one"}))
            .await;
        let second = app
            .create_post(&token, json!({"category_id": category, "title": "Two", "slug": "two"}))
            .await;

        let res = app.get_with_token(routes::POSTS, &token).await;

        assert_eq!(res.body["posts"][0]["id"], second);
        assert_eq!(res.body["posts"][1]["id"], first);
    }
}
