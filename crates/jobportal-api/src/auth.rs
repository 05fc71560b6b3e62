use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use jobportal_db::models::{NewUser, SessionRow};
use jobportal_types::api::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, RoleResponse, VerifyOtpRequest,
};
use jobportal_types::{CoreError, Role};

use crate::error::{AppError, AppResult, JsonBody};
use crate::mailer::otp_email;
use crate::middleware::AuthUser;
use crate::password::{hash_password, verify_password};
use crate::session::{self, clear_cookie, load_session, start_session};
use crate::state::{AppState, blocking};
use crate::token::{issue_token, token_ttl};

pub const OTP_TTL_MINUTES: i64 = 10;

/// Six decimal digits, leading zeros kept.
pub fn generate_otp() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

/// Accepts through the expiry instant itself; rejects strictly after it.
pub fn check_otp(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    supplied: &str,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    match stored {
        Some(otp) if otp == supplied.trim() => {}
        _ => return Err(CoreError::validation("Invalid OTP")),
    }
    match expires_at {
        Some(expiry) if expiry < now => Err(CoreError::validation("OTP expired")),
        Some(_) => Ok(()),
        None => Err(CoreError::validation("OTP expired")),
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hashing_failed(e: argon2::password_hash::Error) -> AppError {
    AppError::InternalError(format!("password hashing failed: {e}"))
}

fn token_failed(e: jsonwebtoken::errors::Error) -> AppError {
    AppError::InternalError(format!("token signing failed: {e}"))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let (Some(name), Some(email), Some(password), Some(role)) = (
        required(req.name),
        required(req.email),
        required(req.password),
        required(req.role),
    ) else {
        return Err(CoreError::validation("Name, email, password and role are required").into());
    };
    let role: Role = role
        .parse()
        .map_err(|_| CoreError::validation("Role must be jobseeker or recruiter"))?;
    let email = normalize_email(&email);

    let lookup = email.clone();
    if blocking(&state, move |db| db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(CoreError::conflict("Email already registered").into());
    }

    let password_hash = hash_password(&password).map_err(hashing_failed)?;
    let otp = generate_otp();
    let now = Utc::now();
    let user_id = Uuid::new_v4().to_string();

    let created = {
        let (email, otp) = (email.clone(), otp.clone());
        blocking(&state, move |db| {
            db.create_user(&NewUser {
                id: &user_id,
                name: &name,
                email: &email,
                password_hash: &password_hash,
                role,
                otp: &otp,
                otp_expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
                created_at: now,
            })
        })
        .await?
    };
    // Lost a race with a concurrent registration of the same email.
    if !created {
        return Err(CoreError::conflict("Email already registered").into());
    }
    info!("Registered {} as {}", email, role);

    let (subject, body) = otp_email(&otp);
    if let Err(e) = state.notifier.send(&email, &subject, &body).await {
        warn!("Failed to send OTP email to {}: {}", email, e);
    }

    let jar = start_session(&state, jar, None, None, Some(email)).await?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(MessageResponse::new(
            "Registered. Check your email for the verification code",
        )),
    ))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Json(req), _): JsonBody<VerifyOtpRequest>,
) -> AppResult<impl IntoResponse> {
    let session = load_session(&state, &headers).await?;
    let Some((session, email)) = session.and_then(|s| {
        let email = s.pending_email.clone()?;
        Some((s, email))
    }) else {
        return Err(CoreError::Session("Session expired".into()).into());
    };

    let user = blocking(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(CoreError::NotFound("User"))?;

    let now = Utc::now();
    check_otp(
        user.otp.as_deref(),
        user.otp_expires_at,
        req.otp.as_deref().unwrap_or_default(),
        now,
    )?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|_| AppError::InternalError(format!("corrupt user id {}", user.id)))?;
    let token = issue_token(user_id, &state.config.jwt_secret).map_err(token_failed)?;

    let bound = SessionRow {
        user_id: Some(user.id.clone()),
        token: Some(token.clone()),
        pending_email: None,
        expires_at: now + token_ttl(),
        ..session
    };
    let id = user.id.clone();
    blocking(&state, move |db| {
        db.mark_user_verified(&id, now)?;
        db.upsert_session(&bound)
    })
    .await?;
    info!("Verified {}", user.email);

    Ok(Json(AuthResponse {
        message: "Email verified".into(),
        role: user.role,
        token,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let (Some(email), Some(password)) = (required(req.email), required(req.password)) else {
        return Err(CoreError::validation("Email and password are required").into());
    };
    let email = normalize_email(&email);

    let invalid = || CoreError::Unauthorized("Invalid email or password".into());

    let user = blocking(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password).map_err(hashing_failed)? {
        return Err(invalid().into());
    }
    if !user.is_verified {
        return Err(CoreError::Forbidden("Verify email first".into()).into());
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|_| AppError::InternalError(format!("corrupt user id {}", user.id)))?;
    let token = issue_token(user_id, &state.config.jwt_secret).map_err(token_failed)?;

    // Drop any session the browser already had before binding a new one.
    if let Some(old) = session::session_id_from_jar(&jar) {
        blocking(&state, move |db| db.delete_session(&old)).await?;
    }
    let jar = start_session(&state, jar, Some(user.id.clone()), Some(token.clone()), None).await?;
    info!("{} logged in", user.email);

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".into(),
            role: user.role,
            token,
        }),
    ))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> AppResult<impl IntoResponse> {
    if let Some(id) = session::session_id_from_jar(&jar) {
        blocking(&state, move |db| db.delete_session(&id)).await?;
    }
    Ok((clear_cookie(jar), Json(MessageResponse::new("Logged out"))))
}

pub async fn get_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AppResult<Json<RoleResponse>> {
    let id = auth.id.to_string();
    let user = blocking(&state, move |db| db.get_user_by_id(&id))
        .await?
        .ok_or(CoreError::NotFound("User"))?;
    Ok(Json(RoleResponse { role: user.role }))
}
