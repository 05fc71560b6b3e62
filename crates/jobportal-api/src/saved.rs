use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;

use jobportal_types::CoreError;
use jobportal_types::api::{MessageResponse, SavedJobsResponse};

use crate::convert::{self, parse_id};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

pub async fn save_job(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(job_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let job_id = parse_id(&job_id, "job")?.to_string();

    let found = blocking(&state, move |db| match db.get_job(&job_id)? {
        Some(job) => db.save_job(&user.id, &job.id, Utc::now()).map(|_| true),
        None => Ok(false),
    })
    .await?;
    if !found {
        return Err(CoreError::NotFound("Job").into());
    }

    Ok(Json(MessageResponse::new("Job saved")))
}

/// Succeeds whether or not the job was saved, or still exists.
pub async fn unsave_job(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(job_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let job_id = parse_id(&job_id, "job")?.to_string();
    blocking(&state, move |db| db.unsave_job(&user.id, &job_id)).await?;

    Ok(Json(MessageResponse::new("Job removed from saved")))
}

pub async fn list_saved(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<SavedJobsResponse>> {
    let rows = blocking(&state, move |db| db.list_saved_jobs(&user.id)).await?;
    let saved_jobs = convert::jobs(rows)?;

    Ok(Json(SavedJobsResponse {
        total_jobs: saved_jobs.len(),
        saved_jobs,
    }))
}
