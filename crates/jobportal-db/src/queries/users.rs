use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

use jobportal_types::api::{JobseekerProfilePatch, RecruiterProfilePatch};

use super::{OptionalExt, is_unique_violation, json, parsed, to_json};
use crate::Database;
use crate::models::{NewUser, UserRow};

const USER_COLUMNS: &str = "id, name, email, password, role, otp, otp_expires_at, is_verified, \
     phone, address, skills, education, experience, company, company_website, \
     total_jobs_posted, profile_image, resume, created_at, updated_at";

impl Database {
    /// Inserts an unverified user. Returns `false` when the email is taken.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, name, email, password, role, otp, otp_expires_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    user.otp,
                    user.otp_expires_at,
                    user.created_at,
                ],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Flips the verification flag and clears the one-time password.
    pub fn mark_user_verified(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE users SET is_verified = 1, otp = NULL, otp_expires_at = NULL, updated_at = ?2
                 WHERE id = ?1",
                rusqlite::params![id, at],
            )?;
            Ok(n == 1)
        })
    }

    pub fn increment_jobs_posted(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET total_jobs_posted = total_jobs_posted + 1 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    pub fn update_recruiter_profile(
        &self,
        id: &str,
        patch: &RecruiterProfilePatch,
        at: DateTime<Utc>,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    company = COALESCE(?3, company),
                    company_website = COALESCE(?4, company_website),
                    phone = COALESCE(?5, phone),
                    updated_at = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    patch.name,
                    patch.company,
                    patch.company_website,
                    patch.phone,
                    at,
                ],
            )?;
            query_user(conn, "id", id)
        })
    }

    pub fn update_jobseeker_profile(
        &self,
        id: &str,
        patch: &JobseekerProfilePatch,
        at: DateTime<Utc>,
    ) -> Result<Option<UserRow>> {
        let skills = patch.skills.as_ref().map(|v| to_json(v)).transpose()?;
        let education = patch.education.as_ref().map(|v| to_json(v)).transpose()?;
        let experience = patch.experience.as_ref().map(|v| to_json(v)).transpose()?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    phone = COALESCE(?3, phone),
                    address = COALESCE(?4, address),
                    skills = COALESCE(?5, skills),
                    education = COALESCE(?6, education),
                    experience = COALESCE(?7, experience),
                    updated_at = ?8
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    patch.name,
                    patch.phone,
                    patch.address,
                    skills,
                    education,
                    experience,
                    at,
                ],
            )?;
            query_user(conn, "id", id)
        })
    }

    pub fn set_profile_image(&self, id: &str, path: &str, at: DateTime<Utc>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE users SET profile_image = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id, path, at],
            )?;
            Ok(n == 1)
        })
    }

    pub fn set_resume(&self, id: &str, path: &str, at: DateTime<Utc>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE users SET resume = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id, path, at],
            )?;
            Ok(n == 1)
        })
    }
}

/// `column` is always a compile-time constant from this module.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], map_user).optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: parsed(row, 4)?,
        otp: row.get(5)?,
        otp_expires_at: row.get(6)?,
        is_verified: row.get(7)?,
        phone: row.get(8)?,
        address: row.get(9)?,
        skills: json(row, 10)?,
        education: json(row, 11)?,
        experience: json(row, 12)?,
        company: row.get(13)?,
        company_website: row.get(14)?,
        total_jobs_posted: row.get(15)?,
        profile_image: row.get(16)?,
        resume: row.get(17)?,
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
    })
}
