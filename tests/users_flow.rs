mod common;

use axum::http::StatusCode;
use common::{TestApp, body_string, location};
use shutterbox::middleware_layer::auth::REMEMBER_COOKIE;

#[tokio::test]
async fn signup_normalizes_email_and_signs_in() {
    let mut app = TestApp::new();

    let response = app.signup("Ann", " ANN@Example.com ", "longenough").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let user = app.state.users.by_email("ann@example.com").await.unwrap();
    assert_eq!(user.name, "Ann");
    assert_eq!(user.email, "ann@example.com");
    assert!(!user.password_hash.is_empty());
    assert!(user.password.is_none());

    let remember = app.cookie(REMEMBER_COOKIE).unwrap().to_string();
    let signed_in = app.state.users.by_remember(&remember).await.unwrap();
    assert_eq!(signed_in.id, user.id);

    let response = app.get("/galleries").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let mut app = TestApp::new();
    app.signed_up("ann@example.com").await;

    let mut other = app.new_session();
    let response = other.signup("Ann", "ann@example.com", "longenough").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(other.cookie(REMEMBER_COOKIE).is_none());

    let body = body_string(response).await;
    assert!(body.contains("Email address is already taken"));
    // The form keeps what was typed.
    assert!(body.contains("value=\"ann@example.com\""));
}

#[tokio::test]
async fn short_password_is_rejected() {
    let mut app = TestApp::new();

    let response = app.signup("Ann", "ann@example.com", "short").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_string(response).await;
    assert!(body.contains("Password length must be at least 8 characters"));
    assert!(app.state.users.by_email("ann@example.com").await.is_err());
}

#[tokio::test]
async fn forms_without_csrf_token_are_forbidden() {
    let mut app = TestApp::new();
    app.get("/signup").await;

    let response = app
        .post_form(
            "/signup",
            &[
                ("name", "Ann"),
                ("email", "ann@example.com"),
                ("password", "longenough"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_form(
            "/signup",
            &[
                ("email", "ann@example.com"),
                ("password", "longenough"),
                ("csrf_token", "forged"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.state.users.by_email("ann@example.com").await.is_err());
}

#[tokio::test]
async fn login_checks_password() {
    let mut app = TestApp::new();
    app.signed_up("ann@example.com").await;

    let mut browser = app.new_session();
    let response = browser
        .submit(
            "/login",
            &[("email", "ann@example.com"), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_string(response).await;
    assert!(body.contains("Invalid email address or password"));
    assert!(browser.cookie(REMEMBER_COOKIE).is_none());

    let response = browser
        .submit(
            "/login",
            &[("email", "nobody@example.com"), ("password", "longenough")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = browser
        .submit(
            "/login",
            &[("email", " Ann@Example.com"), ("password", "longenough")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(browser.cookie(REMEMBER_COOKIE).is_some());
}

#[tokio::test]
async fn signing_in_elsewhere_rotates_the_token() {
    let mut app = TestApp::new();
    app.signed_up("ann@example.com").await;
    let first = app.cookie(REMEMBER_COOKIE).unwrap().to_string();

    let mut laptop = app.new_session();
    laptop
        .submit(
            "/login",
            &[("email", "ann@example.com"), ("password", "longenough")],
        )
        .await;
    let second = laptop.cookie(REMEMBER_COOKIE).unwrap().to_string();
    assert_ne!(first, second);

    // Only the latest token resolves.
    assert!(app.state.users.by_remember(&first).await.is_err());
    assert!(app.state.users.by_remember(&second).await.is_ok());
}

#[tokio::test]
async fn logout_invalidates_the_old_cookie() {
    let mut app = TestApp::new();
    app.signed_up("ann@example.com").await;
    let remember = app.cookie(REMEMBER_COOKIE).unwrap().to_string();

    let response = app.submit("/logout", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(app.cookie(REMEMBER_COOKIE).is_none());

    // Replaying the old cookie no longer signs anyone in.
    app.set_cookie(REMEMBER_COOKIE, &remember);
    let response = app.get("/galleries").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    let mut app = TestApp::new();

    for uri in ["/galleries", "/galleries/new", "/galleries/1/edit"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login");
    }

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("href=\"/signup\""));
}
