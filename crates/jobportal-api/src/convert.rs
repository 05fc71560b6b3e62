//! Row to response conversions, and path-id parsing.

use uuid::Uuid;

use jobportal_db::models::{
    ApplicantBriefRow, ApplicationRow, JobBriefRow, JobRow, RecruiterBriefRow, UserRow,
};
use jobportal_types::CoreError;
use jobportal_types::api::{
    ApplicantBrief, ApplicationResponse, JobBrief, JobResponse, JobseekerProfile, RecruiterBrief,
    RecruiterProfile,
};

use crate::error::{AppError, AppResult};

/// Parses a path id, rejecting malformed input as a validation error.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::validation(format!("Invalid {what} id")))
}

/// Ids in the store are always written from a `Uuid`.
fn stored_id(raw: &str) -> AppResult<Uuid> {
    raw.parse()
        .map_err(|_| AppError::InternalError(format!("corrupt id in store: {raw}")))
}

pub fn job(row: JobRow) -> AppResult<JobResponse> {
    Ok(JobResponse {
        id: stored_id(&row.id)?,
        recruiter_id: stored_id(&row.recruiter_id)?,
        title: row.title,
        description: row.description,
        location: row.location,
        company: row.company,
        salary: row.salary,
        experience: row.experience,
        skills_required: row.skills_required,
        employment_type: row.employment_type,
        responsibility: row.responsibility,
        status: row.status,
        close_date: row.close_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn jobs(rows: Vec<JobRow>) -> AppResult<Vec<JobResponse>> {
    rows.into_iter().map(job).collect()
}

pub fn recruiter_brief(row: RecruiterBriefRow) -> AppResult<RecruiterBrief> {
    Ok(RecruiterBrief {
        id: stored_id(&row.id)?,
        name: row.name,
        company: row.company,
    })
}

pub fn application(row: ApplicationRow) -> AppResult<ApplicationResponse> {
    let interview = row.interview();
    Ok(ApplicationResponse {
        id: stored_id(&row.id)?,
        job_id: stored_id(&row.job_id)?,
        applicant_id: stored_id(&row.applicant_id)?,
        resume: row.resume,
        status: row.status,
        timeline: row.timeline,
        interview,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn job_brief(row: JobBriefRow) -> AppResult<JobBrief> {
    Ok(JobBrief {
        id: stored_id(&row.id)?,
        title: row.title,
        company: row.company,
        location: row.location,
    })
}

pub fn applicant_brief(row: ApplicantBriefRow) -> AppResult<ApplicantBrief> {
    Ok(ApplicantBrief {
        id: stored_id(&row.id)?,
        name: row.name,
        email: row.email,
        phone: row.phone,
        resume: row.resume,
    })
}

pub fn recruiter_profile(user: UserRow) -> RecruiterProfile {
    RecruiterProfile {
        name: user.name,
        email: user.email,
        company: user.company,
        company_website: user.company_website,
        phone: user.phone,
        profile_image: user.profile_image,
    }
}

pub fn jobseeker_profile(user: UserRow) -> JobseekerProfile {
    JobseekerProfile {
        name: user.name,
        email: user.email,
        phone: user.phone,
        address: user.address,
        skills: user.skills,
        education: user.education,
        experience: user.experience,
        profile_image: user.profile_image,
        resume: user.resume,
    }
}
