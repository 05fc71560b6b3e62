#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use futures_util::future::BoxFuture;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use jobportal_api::config::ApiConfig;
use jobportal_api::mailer::{MailError, Notifier};
use jobportal_api::storage::Storage;
use jobportal_api::{AppState, AppStateInner, build_router};
use jobportal_db::Database;
use jobportal_types::StatusPolicy;

pub const PASSWORD: &str = "s3cret-pass";
pub const BOUNDARY: &str = "jobportal-test-boundary";

/// Records every mail instead of sending it.
#[derive(Default)]
pub struct CapturingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl CapturingNotifier {
    /// The six-digit code from the latest mail to `to`.
    pub fn last_otp(&self, to: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .rev()
            .find(|(recipient, _, _)| recipient == to)
            .and_then(|(_, _, body)| {
                body.split_whitespace()
                    .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
                    .map(String::from)
            })
    }
}

impl Notifier for CapturingNotifier {
    fn send<'a>(
        &'a self,
        to: &'a str,
        subject: &'a str,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        })
    }
}

/// Fails every delivery.
pub struct BrokenNotifier;

impl Notifier for BrokenNotifier {
    fn send<'a>(&'a self, _: &'a str, _: &'a str, _: &'a str) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async { Err(MailError::Build("smtp down".into())) })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mail: Arc<CapturingNotifier>,
    pub uploads: TempDir,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Response {
    /// `name=value` of the session cookie set by this response, ready for a
    /// `Cookie` header.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("jobportal.sid="))
            .and_then(|v| v.split(';').next())
            .map(String::from)
    }
}

pub fn test_config(dir: &TempDir, policy: StatusPolicy) -> ApiConfig {
    ApiConfig {
        host: "127.0.0.1".into(),
        port: 0,
        db_path: ":memory:".into(),
        jwt_secret: "integration-test-secret-0123456789".into(),
        upload_dir: dir.path().to_path_buf(),
        cors_origins: vec!["http://localhost:5173".into()],
        cookie_secure: false,
        status_policy: policy,
        session_cleanup_secs: 3600,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_policy(StatusPolicy::Compatible).await
    }

    pub async fn with_policy(policy: StatusPolicy) -> Self {
        let mail = Arc::new(CapturingNotifier::default());
        Self::build(policy, mail.clone(), mail).await
    }

    pub async fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        Self::build(StatusPolicy::Compatible, notifier, Arc::new(CapturingNotifier::default())).await
    }

    async fn build(
        policy: StatusPolicy,
        notifier: Arc<dyn Notifier>,
        mail: Arc<CapturingNotifier>,
    ) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            config: test_config(&uploads, policy),
            notifier,
            storage: Storage::new(uploads.path().to_path_buf()).await.unwrap(),
        });
        Self {
            router: build_router(state.clone()),
            state,
            mail,
            uploads,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        Response {
            status,
            headers,
            body,
        }
    }

    /// JSON request with optional bearer token.
    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    /// JSON request authenticated only by a session cookie.
    pub async fn call_with_cookie(&self, method: Method, uri: &str, cookie: &str, body: Option<Value>) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(COOKIE, cookie)
            .header(CONTENT_TYPE, "application/json");
        let body = body.map(|b| b.to_string()).unwrap_or_else(|| "{}".into());
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn register(&self, name: &str, email: &str, role: &str) -> Response {
        self.call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": PASSWORD, "role": role })),
        )
        .await
    }

    /// Registers, verifies through the emailed OTP and returns the token.
    pub async fn verified_user(&self, email: &str, role: &str) -> String {
        let res = self.register("Test User", email, role).await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        let cookie = res.session_cookie().expect("pending session cookie");
        let otp = self.mail.last_otp(email).expect("otp mail");

        let res = self
            .call_with_cookie(Method::POST, "/api/auth/verify", &cookie, Some(json!({ "otp": otp })))
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        res.body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_job(&self, token: &str, title: &str) -> String {
        let res = self
            .call(
                Method::POST,
                "/api/jobs/create",
                Some(token),
                Some(json!({
                    "title": title,
                    "description": "Build and run services",
                    "company": "Acme",
                    "location": "Remote",
                    "skillsRequired": ["rust", "sqlite"],
                    "employmentType": "Full-Time",
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        res.body["job"]["id"].as_str().unwrap().to_string()
    }

    pub async fn apply(&self, token: &str, job_id: &str) -> Response {
        self.call(Method::POST, &format!("/api/apply/{job_id}"), Some(token), None).await
    }

    pub async fn multipart(&self, uri: &str, token: &str, field: &str, file_name: &str, mime: &str, bytes: &[u8]) -> Response {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }
}
