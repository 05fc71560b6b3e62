use axum::{
    Extension, Json,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use jobportal_db::models::NewApplication;
use jobportal_types::api::{
    AppliedResponse, ApplicationListResponse, DashboardSummary, JobApplicantResponse,
    MessageResponse, MyApplicationResponse, MyApplicationsQuery, StatusUpdatedResponse,
    UpdateStatusRequest,
};
use jobportal_types::status::StatusChange;
use jobportal_types::{ApplicationStatus, CoreError};

use crate::convert::{self, parse_id};
use crate::error::{AppResult, JsonBody};
use crate::jobs::owned_job;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};
use crate::storage::{BlobKind, read_file_field};

fn already_applied() -> CoreError {
    CoreError::conflict("Already applied")
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Accepts an empty body, or a multipart body with an optional `resume` file.
pub async fn apply(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(job_id): Path<String>,
    req: Request,
) -> AppResult<impl IntoResponse> {
    let job_id = parse_id(&job_id, "job")?.to_string();

    let (jid, uid) = (job_id.clone(), user.id.clone());
    let (job, existing) = blocking(&state, move |db| {
        Ok((db.get_job(&jid)?, db.find_application(&jid, &uid)?))
    })
    .await?;
    if job.is_none() {
        return Err(CoreError::NotFound("Job").into());
    }
    if existing.is_some() {
        return Err(already_applied().into());
    }

    let uploaded = if is_multipart(&req) {
        let mut multipart = Multipart::from_request(req, &state)
            .await
            .map_err(|e| CoreError::validation(e.body_text()))?;
        match read_file_field(&mut multipart, "resume").await? {
            Some(upload) => Some(state.storage.put(&upload, BlobKind::Document).await?),
            None => None,
        }
    } else {
        None
    };
    let resume = uploaded.or(user.resume).unwrap_or_default();

    let id = Uuid::new_v4().to_string();
    let applicant_id = user.id;
    let application = blocking(&state, move |db| {
        db.insert_application(&NewApplication {
            id: &id,
            job_id: &job_id,
            applicant_id: &applicant_id,
            resume: &resume,
            created_at: Utc::now(),
        })
    })
    .await?
    .ok_or_else(already_applied)?;
    info!("Application {} created for job {}", application.id, application.job_id);

    Ok((
        StatusCode::CREATED,
        Json(AppliedResponse {
            message: "Applied successfully".into(),
            application: convert::application(application)?,
        }),
    ))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "application")?.to_string();

    let (aid, uid) = (id.clone(), user.id.clone());
    let application = blocking(&state, move |db| db.get_own_application(&aid, &uid))
        .await?
        .ok_or(CoreError::NotFound("Application"))?;

    let stage = CoreError::conflict("Cannot withdraw at this stage");
    if !application.status.can_withdraw() {
        return Err(stage.into());
    }
    // The guarded delete re-checks the stage in case it moved meanwhile.
    if !blocking(&state, move |db| db.withdraw_application(&id, &user.id)).await? {
        return Err(stage.into());
    }
    info!("Application {} withdrawn", application.id);

    Ok(Json(MessageResponse::new("Application withdrawn")))
}

pub async fn my_applications(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<MyApplicationsQuery>,
) -> AppResult<Json<ApplicationListResponse<MyApplicationResponse>>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<ApplicationStatus>()
                .map_err(|_| CoreError::validation("Invalid status filter"))?,
        ),
    };

    let rows = blocking(&state, move |db| db.list_applications_for_applicant(&user.id, status)).await?;
    let applications = rows
        .into_iter()
        .map(|(application, job)| {
            Ok(MyApplicationResponse {
                application: convert::application(application)?,
                job: job.map(convert::job_brief).transpose()?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(ApplicationListResponse {
        total: applications.len(),
        applications,
    }))
}

pub async fn list_for_job(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(job_id): Path<String>,
) -> AppResult<Json<ApplicationListResponse<JobApplicantResponse>>> {
    let job_id = parse_id(&job_id, "job")?;
    owned_job(&state, job_id, &user).await?;

    let id = job_id.to_string();
    let rows = blocking(&state, move |db| db.list_applications_for_job(&id)).await?;
    let applications = rows
        .into_iter()
        .map(|(application, applicant)| {
            Ok(JobApplicantResponse {
                application: convert::application(application)?,
                applicant: applicant.map(convert::applicant_brief).transpose()?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(ApplicationListResponse {
        total: applications.len(),
        applications,
    }))
}

/// Ownership is checked through the application's job, never the applicant.
pub async fn set_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    WithRejection(Json(req), _): JsonBody<UpdateStatusRequest>,
) -> AppResult<Json<StatusUpdatedResponse>> {
    let id = parse_id(&id, "application")?.to_string();
    let to: ApplicationStatus = req
        .status
        .as_deref()
        .ok_or_else(|| CoreError::validation("Status is required"))?
        .parse()
        .map_err(|_| CoreError::validation("Invalid status"))?;

    let lookup = id.clone();
    let owned = blocking(&state, move |db| db.get_application_with_owner(&lookup))
        .await?
        .ok_or(CoreError::NotFound("Application"))?;
    let owner_id = owned.owner_id.ok_or(CoreError::NotFound("Job"))?;
    if owner_id != user.id {
        return Err(CoreError::forbidden().into());
    }

    let from = owned.application.status;
    let change = match state.config.status_policy.check(from, to)? {
        StatusChange::Changed { to, .. } => Some(to),
        StatusChange::Unchanged => None,
    };
    let interview = req.interview.filter(|d| !d.is_empty());

    if change.is_some() || interview.is_some() {
        let target = id.clone();
        let updated = blocking(&state, move |db| {
            db.update_application(&target, from, change, interview.as_ref(), Utc::now())
        })
        .await?;
        if updated.is_none() {
            // Withdrawn or moved by someone else since it was read.
            let gone = blocking(&state, move |db| db.get_application_with_owner(&id))
                .await?
                .is_none();
            let err = if gone {
                CoreError::NotFound("Application")
            } else {
                CoreError::conflict("Application status changed, try again")
            };
            return Err(err.into());
        }
    }
    if change.is_some() {
        info!("Application {} moved {} -> {}", owned.application.id, from, to);
    }

    Ok(Json(StatusUpdatedResponse {
        message: "Status updated".into(),
        status: to,
    }))
}

pub async fn dashboard_summary(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<DashboardSummary>> {
    let counts = blocking(&state, move |db| db.recruiter_dashboard(&user.id)).await?;

    Ok(Json(DashboardSummary {
        total_jobs: counts.total_jobs,
        total_applications: counts.total_applications,
        shortlisted: counts.shortlisted,
        hired: counts.hired,
    }))
}
