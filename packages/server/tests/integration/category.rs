use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn category_ids(body: &Value) -> Vec<i64> {
    body["categories"]
        .as_array()
        .expect("categories array")
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect()
}

fn order_indices(body: &Value) -> Vec<i64> {
    body["categories"]
        .as_array()
        .expect("categories array")
        .iter()
        .map(|c| c["order_index"].as_i64().unwrap())
        .collect()
}

mod crud {
    use super::*;

    #[tokio::test]
    async fn created_categories_are_appended() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let a = app.create_category(&token, "news").await;
        let b = app.create_category(&token, "guides").await;

        let res = app.get_with_token(routes::CATEGORIES, &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(category_ids(&res.body), vec![a as i64, b as i64]);
        assert_eq!(order_indices(&res.body), vec![1, 2]);
        assert_eq!(res.body["categories"][0]["post_count"], 0);
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_category(&token, "news").await;

        let res = app
            .post_with_token(routes::CATEGORIES, &json!({"slug": "news", "name": "Again"}), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn invalid_slug_or_name_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        for body in [
            json!({"slug": "Has Spaces", "name": "X"}),
            json!({"slug": "ok", "name": ""}),
            json!({"slug": "a".repeat(51), "name": "X"}),
        ] {
            let res = app.post_with_token(routes::CATEGORIES, &body, &token).await;
            assert_eq!(res.status, 400, "{body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn patch_updates_slug_and_name() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_category(&token, "news").await;

        let res = app
            .patch_with_token(&routes::category(id), &json!({"name": "Latest News"}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Latest News");
        assert_eq!(res.body["slug"], "news");

        let res = app.get_with_token(&routes::category(id), &token).await;
        assert_eq!(res.body["name"], "Latest News");
    }

    #[tokio::test]
    async fn category_with_posts_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_category(&token, "news").await;
        app.create_post(&token, json!({"category_id": id, "title": "Hello", "slug": "hello"}))
            .await;

        let res = app.delete_with_token(&routes::category(id), &token).await;
        assert_eq!(res.status, 409);

        let res = app.get_with_token(&routes::category(id), &token).await;
        assert_eq!(res.body["post_count"], 1);
    }

    #[tokio::test]
    async fn empty_category_can_be_deleted() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_category(&token, "news").await;

        let res = app.delete_with_token(&routes::category(id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::category(id), &token).await;
        assert_eq!(res.status, 404);
    }
}

mod reorder {
    use super::*;

    async fn three_categories(app: &TestApp, token: &str) -> Vec<i64> {
        let mut ids = Vec::new();
        for slug in ["a", "b", "c"] {
            ids.push(app.create_category(token, slug).await as i64);
        }
        ids
    }

    #[tokio::test]
    async fn new_order_is_applied() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let ids = three_categories(&app, &token).await;
        let wanted = vec![ids[2], ids[0], ids[1]];

        let res = app
            .put_with_token(routes::CATEGORIES_REORDER, &json!({"category_ids": wanted}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["outcome"], "reordered");
        assert_eq!(category_ids(&res.body), wanted);
        assert_eq!(order_indices(&res.body), vec![1, 2, 3]);

        let listed = app.get_with_token(routes::CATEGORIES, &token).await;
        assert_eq!(category_ids(&listed.body), wanted);
    }

    #[tokio::test]
    async fn current_order_is_a_no_op() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let ids = three_categories(&app, &token).await;
        let before = app.get_with_token(routes::CATEGORIES, &token).await;

        let res = app
            .put_with_token(routes::CATEGORIES_REORDER, &json!({"category_ids": ids}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["outcome"], "unchanged");
        assert_eq!(res.body["categories"], before.body["categories"]);
    }

    #[tokio::test]
    async fn stale_list_returns_current_order_unchanged() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let ids = three_categories(&app, &token).await;

        let res = app
            .put_with_token(
                routes::CATEGORIES_REORDER,
                &json!({"category_ids": [ids[1], ids[0]]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["outcome"], "stale");
        assert_eq!(category_ids(&res.body), ids);
        assert_eq!(order_indices(&res.body), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn list_with_unknown_id_is_stale() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let ids = three_categories(&app, &token).await;

        let res = app
            .put_with_token(
                routes::CATEGORIES_REORDER,
                &json!({"category_ids": [ids[2], ids[1], ids[0], 424242]}),
                &token,
            )
            .await;

        assert_eq!(res.body["outcome"], "stale");
        assert_eq!(category_ids(&res.body), ids);
    }

    #[tokio::test]
    async fn empty_or_duplicated_list_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let ids = three_categories(&app, &token).await;

        for list in [json!([]), json!([ids[0], ids[0], ids[1], ids[2]])] {
            let res = app
                .put_with_token(routes::CATEGORIES_REORDER, &json!({"category_ids": list}), &token)
                .await;
            assert_eq!(res.status, 400, "{list}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }
}
