use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use jobportal_db::models::UserRow;
use jobportal_types::{CoreError, Role};

use crate::error::AppResult;
use crate::session::load_session;
use crate::state::{AppState, blocking};
use crate::token::verify_token;

/// Identity attached by [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Full user record attached by the role guards.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

/// Finds the caller's token: the session cookie's bound token first, then an
/// `Authorization: Bearer` header.
pub async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> AppResult<Option<String>> {
    if let Some(token) = load_session(state, headers).await?.and_then(|s| s.token) {
        return Ok(Some(token));
    }

    Ok(headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<AuthUser> {
    let token = resolve_identity(state, headers)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("Not authenticated".into()))?;

    let claims = verify_token(&token, &state.config.jwt_secret)
        .map_err(|_| CoreError::Unauthorized("Invalid or expired token".into()))?;

    Ok(AuthUser { id: claims.sub })
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

pub async fn require_recruiter(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> AppResult<Response> {
    require_role(state, req, next, Role::Recruiter).await
}

pub async fn require_jobseeker(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> AppResult<Response> {
    require_role(state, req, next, Role::Jobseeker).await
}

/// Role is always re-read from the store, never trusted from the token.
async fn require_role(state: AppState, mut req: Request, next: Next, role: Role) -> AppResult<Response> {
    let auth = authenticate(&state, req.headers()).await?;

    let id = auth.id.to_string();
    let user = blocking(&state, move |db| db.get_user_by_id(&id))
        .await?
        .ok_or(CoreError::NotFound("User"))?;

    if user.role != role {
        return Err(CoreError::forbidden().into());
    }

    req.extensions_mut().insert(auth);
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
