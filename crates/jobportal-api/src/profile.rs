//! Role-specific profile views, patches and uploads. The role guard on each
//! route decides which contract applies.

use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use tracing::info;

use jobportal_types::CoreError;
use jobportal_types::api::{
    JobseekerProfile, JobseekerProfilePatch, ProfileImageResponse, ProfileResponse,
    ProfileUpdatedResponse, RecruiterProfile, RecruiterProfilePatch, ResumeResponse,
};

use crate::convert;
use crate::error::{AppResult, JsonBody};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};
use crate::storage::{BlobKind, Upload, read_file_field};

fn check_name(name: &Option<String>) -> Result<(), CoreError> {
    match name {
        Some(n) if n.trim().is_empty() => Err(CoreError::validation("Name cannot be empty")),
        _ => Ok(()),
    }
}

async fn required_upload(multipart: &mut Multipart, field: &str) -> AppResult<Upload> {
    read_file_field(multipart, field)
        .await?
        .ok_or_else(|| CoreError::validation("No file uploaded").into())
}

pub async fn get_recruiter(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ProfileResponse<RecruiterProfile>> {
    Json(ProfileResponse {
        profile: convert::recruiter_profile(user),
    })
}

pub async fn update_recruiter(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(Json(patch), _): JsonBody<RecruiterProfilePatch>,
) -> AppResult<Json<ProfileUpdatedResponse<RecruiterProfile>>> {
    check_name(&patch.name)?;
    let updated = blocking(&state, move |db| {
        db.update_recruiter_profile(&user.id, &patch, Utc::now())
    })
    .await?
    .ok_or(CoreError::NotFound("User"))?;

    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated".into(),
        profile: convert::recruiter_profile(updated),
    }))
}

pub async fn get_jobseeker(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ProfileResponse<JobseekerProfile>> {
    Json(ProfileResponse {
        profile: convert::jobseeker_profile(user),
    })
}

pub async fn update_jobseeker(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(Json(patch), _): JsonBody<JobseekerProfilePatch>,
) -> AppResult<Json<ProfileUpdatedResponse<JobseekerProfile>>> {
    check_name(&patch.name)?;
    let updated = blocking(&state, move |db| {
        db.update_jobseeker_profile(&user.id, &patch, Utc::now())
    })
    .await?
    .ok_or(CoreError::NotFound("User"))?;

    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated".into(),
        profile: convert::jobseeker_profile(updated),
    }))
}

/// Multipart field `profileImage`. Shared by both roles.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Json<ProfileImageResponse>> {
    let upload = required_upload(&mut multipart, "profileImage").await?;
    let path = state.storage.put(&upload, BlobKind::Image).await?;

    let stored = path.clone();
    blocking(&state, move |db| db.set_profile_image(&user.id, &stored, Utc::now())).await?;
    info!("Profile image updated: {}", path);

    Ok(Json(ProfileImageResponse {
        message: "Profile image updated".into(),
        profile_image: path,
    }))
}

/// Multipart field `resume`.
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Json<ResumeResponse>> {
    let upload = required_upload(&mut multipart, "resume").await?;
    let path = state.storage.put(&upload, BlobKind::Document).await?;

    let stored = path.clone();
    blocking(&state, move |db| db.set_resume(&user.id, &stored, Utc::now())).await?;
    info!("Resume updated: {}", path);

    Ok(Json(ResumeResponse {
        message: "Resume updated".into(),
        resume: path,
    }))
}
