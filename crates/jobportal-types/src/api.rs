use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    EducationEntry, EmploymentType, ExperienceEntry, InterviewDetail, JobStatus, Role,
    TimelineEntry,
};
use crate::status::ApplicationStatus;

// -- JWT Claims --

/// Claims carried by the signed session token. Only the identity travels in
/// the token; role is always re-read from the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

// -- Auth --

/// Fields are optional so that a missing value surfaces as a validation
/// error rather than a body-parse rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyOtpRequest {
    pub otp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Jobs --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub salary: Option<String>,
    pub experience: Option<String>,
    #[serde(default)]
    pub skills_required: Vec<String>,
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub responsibility: Vec<String>,
    pub close_date: Option<DateTime<Utc>>,
}

/// Whitelisted mutable job fields. Anything else in the body is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub salary: Option<String>,
    pub experience: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub employment_type: Option<EmploymentType>,
    pub responsibility: Option<Vec<String>>,
    pub status: Option<JobStatus>,
    pub close_date: Option<DateTime<Utc>>,
}

/// `page` and `limit` arrive as raw strings and are coerced leniently.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub recruiter_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub company: String,
    pub salary: Option<String>,
    pub experience: Option<String>,
    pub skills_required: Vec<String>,
    pub employment_type: Option<EmploymentType>,
    pub responsibility: Vec<String>,
    pub status: JobStatus,
    pub close_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecruiterBrief {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub job: JobResponse,
    pub recruiter: Option<RecruiterBrief>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobEnvelope<T> {
    pub job: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobMutationResponse {
    pub message: String,
    pub job: JobResponse,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPageResponse {
    pub total_jobs: u64,
    pub page: u32,
    pub per_page: u32,
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub total_jobs: usize,
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobsResponse {
    pub total_jobs: usize,
    pub saved_jobs: Vec<JobResponse>,
}

// -- Applications --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub resume: String,
    pub status: ApplicationStatus,
    pub timeline: Vec<TimelineEntry>,
    pub interview: Option<InterviewDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobBrief {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
}

/// An applicant's own application with the job resolved. `job` is `None`
/// when the job was deleted but the cascade did not finish.
#[derive(Debug, Serialize, Deserialize)]
pub struct MyApplicationResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub job: Option<JobBrief>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantBrief {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobApplicantResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub applicant: Option<ApplicantBrief>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationListResponse<T> {
    pub total: usize,
    pub applications: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppliedResponse {
    pub message: String,
    pub application: ApplicationResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct MyApplicationsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub interview: Option<InterviewDetail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdatedResponse {
    pub message: String,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_jobs: u64,
    pub total_applications: u64,
    pub shortlisted: u64,
    pub hired: u64,
}

// -- Profiles --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterProfile {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub company_website: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobseekerProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub skills: Vec<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub profile_image: Option<String>,
    pub resume: Option<String>,
}

/// Fields a recruiter may change on their own profile.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterProfilePatch {
    pub name: Option<String>,
    pub company: Option<String>,
    pub company_website: Option<String>,
    pub phone: Option<String>,
}

/// Fields a jobseeker may change on their own profile.
#[derive(Debug, Default, Deserialize)]
pub struct JobseekerProfilePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<Vec<EducationEntry>>,
    pub experience: Option<Vec<ExperienceEntry>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse<T> {
    pub profile: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileUpdatedResponse<T> {
    pub message: String,
    pub profile: T,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageResponse {
    pub message: String,
    pub profile_image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub message: String,
    pub resume: String,
}
