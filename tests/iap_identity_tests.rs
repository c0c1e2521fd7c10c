// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity behind Identity-Aware Proxy.
//!
//! These tests verify that:
//! 1. Only a signed IAP assertion identifies the caller
//! 2. The development sign-in routes are not mounted
//! 3. Session cookies and unsigned proxy headers are ignored

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use runtracker::identity::IAP_CLEAR_LOGIN_PATH;
use runtracker::services::iap::IAP_ASSERTION_HEADER;
use tower::ServiceExt;

mod common;
use common::{body_text, create_test_app_with_iap, get, iap_assertion, post_form, session_cookie};

const EMAIL: &str = "jane@example.com";

fn with_header(mut request: Request<Body>, name: &'static str, value: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(name, value.parse().unwrap());
    request
}

#[tokio::test]
async fn test_sign_in_routes_not_mounted() {
    let app = create_test_app_with_iap();

    let response = app
        .router
        .clone()
        .oneshot(get("/auth/login?continue=%2F", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .router
        .clone()
        .oneshot(post_form("/auth/login", "email=victim%40example.com", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = app
        .router
        .oneshot(get("/auth/logout", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assertion_signs_in() {
    let app = create_test_app_with_iap();
    let request = with_header(get("/", None), IAP_ASSERTION_HEADER, &iap_assertion(EMAIL));

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Hello, jane!"));
    assert!(html.contains(&format!(r#"<a href="{}">Logout</a>"#, IAP_CLEAR_LOGIN_PATH)));
}

#[tokio::test]
async fn test_assertion_user_can_add_run() {
    let app = create_test_app_with_iap();
    let assertion = iap_assertion(EMAIL);

    let request = with_header(
        post_form("/addRun", "name=5k&distance=5&duration=25%3A00", None),
        IAP_ASSERTION_HEADER,
        &assertion,
    );
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let request = with_header(get("/", None), IAP_ASSERTION_HEADER, &assertion);
    let html = body_text(app.router.oneshot(request).await.unwrap()).await;
    assert!(html.contains("<td>5k</td>"));
    assert_eq!(app.db.find_runners_by_user(EMAIL).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unsigned_proxy_header_is_ignored() {
    let app = create_test_app_with_iap();

    let request = with_header(
        post_form("/addRun", "name=5k", None),
        "x-goog-authenticated-user-email",
        "accounts.google.com:victim@example.com",
    );
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_is_ignored() {
    let app = create_test_app_with_iap();
    let cookie = session_cookie("victim@example.com");

    let response = app
        .router
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .unwrap();
    assert!(!body_text(response).await.contains("Hello, victim!"));

    let response = app
        .router
        .oneshot(post_form("/addRun", "name=5k", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_assertion_is_anonymous() {
    let app = create_test_app_with_iap();

    // Swap the payload for one naming someone else, keeping the signature
    let genuine = iap_assertion(EMAIL);
    let forged_payload = iap_assertion("victim@example.com");
    let parts: Vec<&str> = genuine.split('.').collect();
    let forged_parts: Vec<&str> = forged_payload.split('.').collect();
    let forged = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

    let request = with_header(
        post_form("/addRun", "name=5k", None),
        IAP_ASSERTION_HEADER,
        &forged,
    );
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
