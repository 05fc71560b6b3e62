//! Database row types. These map directly to SQLite rows and are distinct
//! from the jobportal-types API models to keep the DB layer independent.

use chrono::{DateTime, NaiveDate, Utc};
use jobportal_types::models::{EducationEntry, ExperienceEntry, InterviewDetail, TimelineEntry};
use jobportal_types::{ApplicationStatus, EmploymentType, JobStatus, Role};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub skills: Vec<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub company: Option<String>,
    pub company_website: Option<String>,
    pub total_jobs_posted: i64,
    pub profile_image: Option<String>,
    pub resume: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub otp: &'a str,
    pub otp_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub recruiter_id: String,
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

pub struct NewJob<'a> {
    pub id: &'a str,
    pub recruiter_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub company: &'a str,
    pub salary: Option<&'a str>,
    pub experience: Option<&'a str>,
    pub skills_required: &'a [String],
    pub employment_type: Option<EmploymentType>,
    pub responsibility: &'a [String],
    pub close_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Owner fields joined onto a job for the detail view.
#[derive(Debug, Clone)]
pub struct RecruiterBriefRow {
    pub id: String,
    pub name: String,
    pub company: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    pub resume: String,
    pub status: ApplicationStatus,
    pub interview_date: Option<NaiveDate>,
    pub interview_time: Option<String>,
    pub interview_mode: Option<String>,
    pub timeline: Vec<TimelineEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    pub fn interview(&self) -> Option<InterviewDetail> {
        let detail = InterviewDetail {
            date: self.interview_date,
            time: self.interview_time.clone(),
            mode: self.interview_mode.clone(),
        };
        (!detail.is_empty()).then_some(detail)
    }
}

pub struct NewApplication<'a> {
    pub id: &'a str,
    pub job_id: &'a str,
    pub applicant_id: &'a str,
    pub resume: &'a str,
    pub created_at: DateTime<Utc>,
}

/// An application joined with the recruiter who owns its job. `owner_id` is
/// `None` when the job row is gone.
#[derive(Debug, Clone)]
pub struct OwnedApplicationRow {
    pub application: ApplicationRow,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JobBriefRow {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct ApplicantBriefRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub total_jobs: u64,
    pub total_applications: u64,
    pub shortlisted: u64,
    pub hired: u64,
}

/// A server-side session. `id` is the SHA-256 hex digest of the cookie value.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: String,
    pub user_id: Option<String>,
    pub token: Option<String>,
    pub pending_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
