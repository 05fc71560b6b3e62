//! Server-side sessions carried by the `jobportal.sid` cookie.
//!
//! The cookie holds 32 random bytes (base64url). Only the SHA-256 digest of
//! that value is stored, so a leaked sessions table cannot be replayed.

use std::time::Duration;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use jobportal_db::models::SessionRow;

use crate::error::AppResult;
use crate::state::{AppState, blocking};
use crate::token::token_ttl;

pub const SESSION_COOKIE: &str = "jobportal.sid";

/// Returns `(cookie_value, stored_id)` for a fresh session.
pub fn new_session_id() -> (String, String) {
    let bytes: [u8; 32] = rand::random();
    let raw = B64.encode(bytes);
    let id = digest(&raw);
    (raw, id)
}

pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn session_cookie(raw: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, raw))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn clear_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Stored id of the session named by the request's cookie, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    session_id_from_jar(&CookieJar::from_headers(headers))
}

pub fn session_id_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| digest(c.value()))
}

/// The unexpired session bound to the request's cookie.
pub async fn load_session(state: &AppState, headers: &HeaderMap) -> AppResult<Option<SessionRow>> {
    let Some(id) = session_id_from_headers(headers) else {
        return Ok(None);
    };
    blocking(state, move |db| db.get_session(&id, Utc::now())).await
}

/// Persists a new session and returns the jar with its cookie set. The write
/// completes before the caller responds.
pub async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user_id: Option<String>,
    token: Option<String>,
    pending_email: Option<String>,
) -> AppResult<CookieJar> {
    let (raw, id) = new_session_id();
    let now = Utc::now();
    let row = SessionRow {
        id,
        user_id,
        token,
        pending_email,
        created_at: now,
        expires_at: now + token_ttl(),
    };
    blocking(state, move |db| db.upsert_session(&row)).await?;

    Ok(jar.add(session_cookie(raw, state.config.cookie_secure)))
}

/// Background task that prunes expired sessions.
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match blocking(&state, |db| db.purge_expired_sessions(Utc::now())).await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired sessions", count);
                }
            }
            Err(e) => {
                warn!("Session cleanup error: {}", e);
            }
        }
    }
}
