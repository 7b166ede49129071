use blog_server::admin::AdminUsers;
use blog_server::entity::admin_user;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use crate::common::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn active_admin_can_log_in_and_fetch_profile() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["email_address"], ADMIN_EMAIL);
        assert!(res.body["id"].is_number());
    }

    #[tokio::test]
    async fn email_is_matched_case_insensitively() {
        let app = TestApp::spawn().await;
        app.create_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let res = app.login("  ADMIN@Example.com ", ADMIN_PASSWORD).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["email_address"], ADMIN_EMAIL);
    }

    #[tokio::test]
    async fn login_records_last_login_time() {
        let app = TestApp::spawn().await;
        app.admin_token().await;

        let user = admin_user::Entity::find()
            .filter(admin_user::Column::EmailAddress.eq(ADMIN_EMAIL))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_rejected_alike() {
        let app = TestApp::spawn().await;
        app.create_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let wrong = app.login(ADMIN_EMAIL, "not-the-password").await;
        let unknown = app.login("nobody@example.com", ADMIN_PASSWORD).await;

        for res in [wrong, unknown] {
            assert_eq!(res.status, 401);
            assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
        }
    }

    #[tokio::test]
    async fn inactive_admin_cannot_log_in() {
        let app = TestApp::spawn().await;
        app.create_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        AdminUsers::new(&app.db)
            .set_active(ADMIN_EMAIL, false)
            .await
            .unwrap();

        let res = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn empty_fields_are_validation_errors() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"email_address": "", "password": "x"}))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .post_without_token(routes::LOGIN, &json!({"email_address": ADMIN_EMAIL}))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod token_checks {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn deactivation_revokes_issued_tokens() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        AdminUsers::new(&app.db)
            .set_active(ADMIN_EMAIL, false)
            .await
            .unwrap();
        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn password_reset_revokes_issued_tokens() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        AdminUsers::new(&app.db)
            .reset_password(ADMIN_EMAIL, "another-password")
            .await
            .unwrap();

        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");

        let res = app.login(ADMIN_EMAIL, "another-password").await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() {
        let app = TestApp::spawn().await;

        for path in [routes::CATEGORIES, routes::POSTS] {
            let res = app.get_without_token(path).await;
            assert_eq!(res.status, 401, "{path}");
        }
        let res = app
            .post_without_token(routes::RENDER, &json!({"markdown_text": "hi"}))
            .await;
        assert_eq!(res.status, 401);
    }
}
