mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use common::{BrokenNotifier, PASSWORD, TestApp};

#[tokio::test]
async fn register_verify_login_flow() {
    let app = TestApp::new().await;

    let res = app.register("Ada", "ada@example.com", "jobseeker").await;
    assert_eq!(res.status, StatusCode::CREATED);
    let cookie = res.session_cookie().expect("session cookie");

    // Unverified accounts cannot log in.
    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["error"], "Verify email first");

    let otp = app.mail.last_otp("ada@example.com").expect("otp sent");
    let res = app
        .call_with_cookie(Method::POST, "/api/auth/verify", &cookie, Some(json!({ "otp": otp })))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["role"], "jobseeker");

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ADA@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Login successful");
    assert!(res.session_cookie().is_some());
    let token = res.body["token"].as_str().unwrap().to_string();

    let res = app.call(Method::GET, "/api/auth/get-role", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["role"], "jobseeker");
}

#[tokio::test]
async fn session_cookie_alone_authenticates() {
    let app = TestApp::new().await;
    app.verified_user("rita@example.com", "recruiter").await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "rita@example.com", "password": PASSWORD })),
        )
        .await;
    let cookie = res.session_cookie().unwrap();

    let res = app
        .call_with_cookie(Method::GET, "/api/auth/get-role", &cookie, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["role"], "recruiter");

    let res = app
        .call_with_cookie(Method::POST, "/api/auth/logout", &cookie, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Logged out");

    let res = app
        .call_with_cookie(Method::GET, "/api/auth/get-role", &cookie, None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new().await;
    assert_eq!(app.register("A", "dup@example.com", "jobseeker").await.status, StatusCode::CREATED);

    let res = app.register("B", "Dup@Example.com", "recruiter").await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["code"], "CONFLICT");
}

#[tokio::test]
async fn register_rejects_missing_fields_and_unknown_role() {
    let app = TestApp::new().await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "x@example.com", "password": PASSWORD, "role": "jobseeker" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app.register("X", "x@example.com", "admin").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn undecodable_bodies_use_the_error_envelope() {
    let app = TestApp::new().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.send(req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["error"].is_string());

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "X", "email": "x@example.com", "password": PASSWORD, "role": 5 })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .body(Body::from(r#"{"email":"x@example.com"}"#))
        .unwrap();
    let res = app.send(req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn verify_without_pending_session_is_expired() {
    let app = TestApp::new().await;
    app.register("Ada", "ada@example.com", "jobseeker").await;

    let res = app
        .call(Method::POST, "/api/auth/verify", None, Some(json!({ "otp": "123456" })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "SESSION_EXPIRED");
}

#[tokio::test]
async fn wrong_otp_is_rejected() {
    let app = TestApp::new().await;
    let res = app.register("Ada", "ada@example.com", "jobseeker").await;
    let cookie = res.session_cookie().unwrap();
    let otp = app.mail.last_otp("ada@example.com").unwrap();
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    let res = app
        .call_with_cookie(Method::POST, "/api/auth/verify", &cookie, Some(json!({ "otp": wrong })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Invalid OTP");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.verified_user("ada@example.com", "jobseeker").await;

    for (email, password) in [("ada@example.com", "nope"), ("ghost@example.com", PASSWORD)] {
        let res = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["error"], "Invalid email or password");
    }
}

#[tokio::test]
async fn registration_survives_mail_failure() {
    let app = TestApp::with_notifier(Arc::new(BrokenNotifier)).await;
    let res = app.register("Ada", "ada@example.com", "jobseeker").await;
    assert_eq!(res.status, StatusCode::CREATED);
}

#[tokio::test]
async fn protected_routes_require_credentials() {
    let app = TestApp::new().await;

    let res = app.call(Method::GET, "/api/auth/get-role", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .call(Method::GET, "/api/auth/get-role", Some("not-a-token"), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_guards_reject_the_other_role() {
    let app = TestApp::new().await;
    let seeker = app.verified_user("seeker@example.com", "jobseeker").await;
    let recruiter = app.verified_user("rec@example.com", "recruiter").await;

    let res = app.call(Method::GET, "/api/jobs/recruiter/all", Some(&seeker), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.call(Method::GET, "/api/apply/me", Some(&recruiter), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}
