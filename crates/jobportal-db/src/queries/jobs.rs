use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

use jobportal_types::api::UpdateJobRequest;

use super::{OptionalExt, json, like_pattern, parsed, parsed_opt, to_json};
use crate::Database;
use crate::models::{JobRow, NewJob, RecruiterBriefRow};

pub(crate) const JOB_COLUMNS: &str = "j.id, j.recruiter_id, j.title, j.description, j.location, \
     j.company, j.salary, j.experience, j.skills_required, j.employment_type, j.responsibility, \
     j.status, j.close_date, j.created_at, j.updated_at";

impl Database {
    pub fn insert_job(&self, job: &NewJob<'_>) -> Result<JobRow> {
        let skills = to_json(job.skills_required)?;
        let responsibility = to_json(job.responsibility)?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO jobs (id, recruiter_id, title, description, location, company, salary,
                                   experience, skills_required, employment_type, responsibility,
                                   close_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                rusqlite::params![
                    job.id,
                    job.recruiter_id,
                    job.title,
                    job.description,
                    job.location,
                    job.company,
                    job.salary,
                    job.experience,
                    skills,
                    job.employment_type.map(|t| t.as_str()),
                    responsibility,
                    job.close_date,
                    job.created_at,
                ],
            )?;
            query_job(conn, job.id)?
                .ok_or_else(|| anyhow::anyhow!("Job {} vanished after insert", job.id))
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| query_job(conn, id))
    }

    /// Job plus the owner's name and company in one query.
    pub fn get_job_with_recruiter(
        &self,
        id: &str,
    ) -> Result<Option<(JobRow, Option<RecruiterBriefRow>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOB_COLUMNS}, u.id, u.name, u.company
                 FROM jobs j
                 LEFT JOIN users u ON u.id = j.recruiter_id
                 WHERE j.id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([id], |row| {
                let job = map_job(row)?;
                let recruiter = match row.get::<_, Option<String>>(15)? {
                    Some(id) => Some(RecruiterBriefRow {
                        id,
                        name: row.get(16)?,
                        company: row.get(17)?,
                    }),
                    None => None,
                };
                Ok((job, recruiter))
            })
            .optional()
        })
    }

    /// Applies only the whitelisted fields present in `patch`.
    pub fn update_job(
        &self,
        id: &str,
        patch: &UpdateJobRequest,
        at: DateTime<Utc>,
    ) -> Result<Option<JobRow>> {
        let skills = patch.skills_required.as_ref().map(|v| to_json(v)).transpose()?;
        let responsibility = patch.responsibility.as_ref().map(|v| to_json(v)).transpose()?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE jobs SET
                    title = COALESCE(?2, title),
                    description = COALESCE(?3, description),
                    location = COALESCE(?4, location),
                    company = COALESCE(?5, company),
                    salary = COALESCE(?6, salary),
                    experience = COALESCE(?7, experience),
                    skills_required = COALESCE(?8, skills_required),
                    employment_type = COALESCE(?9, employment_type),
                    responsibility = COALESCE(?10, responsibility),
                    status = COALESCE(?11, status),
                    close_date = COALESCE(?12, close_date),
                    updated_at = ?13
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    patch.title,
                    patch.description,
                    patch.location,
                    patch.company,
                    patch.salary,
                    patch.experience,
                    skills,
                    patch.employment_type.map(|t| t.as_str()),
                    responsibility,
                    patch.status.map(|s| s.as_str()),
                    patch.close_date,
                    at,
                ],
            )?;
            query_job(conn, id)
        })
    }

    pub fn delete_job(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
            Ok(n == 1)
        })
    }

    /// One page of jobs, newest first, plus the total matching count.
    ///
    /// A job matches `terms` when any term occurs, case-insensitively, in its
    /// title, description or required skills. No terms means every job.
    pub fn list_jobs(&self, terms: &[String], offset: u64, limit: u64) -> Result<(Vec<JobRow>, u64)> {
        let patterns: Vec<String> = terms.iter().map(|t| like_pattern(t)).collect();
        let filter = if patterns.is_empty() {
            String::new()
        } else {
            let clauses: Vec<String> = (1..=patterns.len())
                .map(|i| {
                    format!(
                        "(LOWER(j.title) LIKE ?{i} ESCAPE '\\' \
                         OR LOWER(j.description) LIKE ?{i} ESCAPE '\\' \
                         OR LOWER(j.skills_required) LIKE ?{i} ESCAPE '\\')"
                    )
                })
                .collect();
            format!("WHERE {}", clauses.join(" OR "))
        };

        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM jobs j {filter}"),
                rusqlite::params_from_iter(patterns.iter()),
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {JOB_COLUMNS} FROM jobs j {filter}
                 ORDER BY j.created_at DESC, j.rowid DESC
                 LIMIT {limit} OFFSET {offset}"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(patterns.iter()), map_job)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u64))
        })
    }

    pub fn list_jobs_by_recruiter(&self, recruiter_id: &str) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOB_COLUMNS} FROM jobs j
                 WHERE j.recruiter_id = ?1
                 ORDER BY j.created_at DESC, j.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([recruiter_id], map_job)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_job(conn: &Connection, id: &str) -> Result<Option<JobRow>> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM jobs j WHERE j.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([id], map_job).optional()
}

/// Maps the first 15 columns (`JOB_COLUMNS`) of a row.
pub(crate) fn map_job(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        recruiter_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        company: row.get(5)?,
        salary: row.get(6)?,
        experience: row.get(7)?,
        skills_required: json(row, 8)?,
        employment_type: parsed_opt(row, 9)?,
        responsibility: json(row, 10)?,
        status: parsed(row, 11)?,
        close_date: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}
