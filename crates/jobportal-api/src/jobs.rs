use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use jobportal_db::models::{JobRow, NewJob};
use jobportal_types::CoreError;
use jobportal_types::api::{
    ApplicationListResponse, CreateJobRequest, JobApplicantResponse, JobDetailResponse,
    JobEnvelope, JobListResponse, JobMutationResponse, JobPageResponse, ListJobsQuery,
    MessageResponse, UpdateJobRequest,
};

use crate::applications;
use crate::convert::{self, parse_id};
use crate::error::{AppResult, JsonBody};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Lenient page/limit coercion: unparsable values fall back to the defaults,
/// `page` is at least 1 and `limit` is clamped to 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<i64>().ok());

        let page = parse(page).map_or(DEFAULT_PAGE, |p| p.clamp(1, u32::MAX as i64) as u32);
        let limit = parse(limit).map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT as i64) as u32);
        Self { page, limit }
    }

    pub fn offset(self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Loads the job and checks that `user` owns it.
pub(crate) async fn owned_job(state: &AppState, job_id: Uuid, user: &CurrentUser) -> AppResult<JobRow> {
    let id = job_id.to_string();
    let job = blocking(state, move |db| db.get_job(&id))
        .await?
        .ok_or(CoreError::NotFound("Job"))?;
    if job.recruiter_id != user.0.id {
        return Err(CoreError::forbidden().into());
    }
    Ok(job)
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Json(req), _): JsonBody<CreateJobRequest>,
) -> AppResult<impl IntoResponse> {
    let (Some(title), Some(description), Some(company), Some(location)) = (
        non_blank(req.title),
        non_blank(req.description),
        non_blank(req.company),
        non_blank(req.location),
    ) else {
        return Err(
            CoreError::validation("Title, description, company and location are required").into(),
        );
    };

    let id = Uuid::new_v4().to_string();
    let recruiter_id = user.0.id.clone();
    let (salary, experience) = (req.salary, req.experience);
    let (skills_required, responsibility) = (req.skills_required, req.responsibility);
    let (employment_type, close_date) = (req.employment_type, req.close_date);

    let row = blocking(&state, move |db| {
        db.insert_job(&NewJob {
            id: &id,
            recruiter_id: &recruiter_id,
            title: &title,
            description: &description,
            location: &location,
            company: &company,
            salary: salary.as_deref(),
            experience: experience.as_deref(),
            skills_required: &skills_required,
            employment_type,
            responsibility: &responsibility,
            close_date,
            created_at: Utc::now(),
        })
    })
    .await?;
    info!("Job {} created by {}", row.id, row.recruiter_id);

    let owner = user.0.id.clone();
    if let Err(e) = blocking(&state, move |db| db.increment_jobs_posted(&owner)).await {
        warn!("Failed to bump jobs-posted counter for {}: {}", user.0.id, e);
    }

    Ok((
        StatusCode::CREATED,
        Json(JobMutationResponse {
            message: "Job created".into(),
            job: convert::job(row)?,
        }),
    ))
}

pub async fn update_job(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(job_id): Path<String>,
    WithRejection(Json(patch), _): JsonBody<UpdateJobRequest>,
) -> AppResult<Json<JobMutationResponse>> {
    let job_id = parse_id(&job_id, "job")?;
    owned_job(&state, job_id, &user).await?;

    let id = job_id.to_string();
    let row = blocking(&state, move |db| db.update_job(&id, &patch, Utc::now()))
        .await?
        .ok_or(CoreError::NotFound("Job"))?;

    Ok(Json(JobMutationResponse {
        message: "Job updated".into(),
        job: convert::job(row)?,
    }))
}

/// Deletes the job, then its applications. The two steps are separate
/// statements; applications orphaned by a failure in between stay listable.
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(job_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let job_id = parse_id(&job_id, "job")?;
    owned_job(&state, job_id, &user).await?;

    let id = job_id.to_string();
    blocking(&state, move |db| db.delete_job(&id)).await?;

    let id = job_id.to_string();
    match blocking(&state, move |db| db.delete_applications_for_job(&id)).await {
        Ok(n) => info!("Job {} deleted with {} applications", job_id, n),
        Err(e) => warn!("Job {} deleted but its applications remain: {}", job_id, e),
    }

    Ok(Json(MessageResponse::new("Job deleted")))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> AppResult<Json<JobPageResponse>> {
    let pagination = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());
    let terms: Vec<String> = query
        .q
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(String::from)
        .collect();

    let (rows, total) = blocking(&state, move |db| {
        db.list_jobs(&terms, pagination.offset(), pagination.limit as u64)
    })
    .await?;

    Ok(Json(JobPageResponse {
        total_jobs: total,
        page: pagination.page,
        per_page: pagination.limit,
        jobs: convert::jobs(rows)?,
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<JobEnvelope<JobDetailResponse>>> {
    let job_id = parse_id(&job_id, "job")?.to_string();
    let (job, recruiter) = blocking(&state, move |db| db.get_job_with_recruiter(&job_id))
        .await?
        .ok_or(CoreError::NotFound("Job"))?;

    Ok(Json(JobEnvelope {
        job: JobDetailResponse {
            job: convert::job(job)?,
            recruiter: recruiter.map(convert::recruiter_brief).transpose()?,
        },
    }))
}

pub async fn my_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<JobListResponse>> {
    let owner = user.0.id.clone();
    let rows = blocking(&state, move |db| db.list_jobs_by_recruiter(&owner)).await?;
    let jobs = convert::jobs(rows)?;

    Ok(Json(JobListResponse {
        total_jobs: jobs.len(),
        jobs,
    }))
}

/// Same contract as `GET /apply/job/{job_id}`.
pub async fn job_applications(
    state: State<AppState>,
    user: Extension<CurrentUser>,
    job_id: Path<String>,
) -> AppResult<Json<ApplicationListResponse<JobApplicantResponse>>> {
    applications::list_for_job(state, user, job_id).await
}
