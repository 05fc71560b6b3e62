use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                  TEXT PRIMARY KEY,
                name                TEXT NOT NULL,
                email               TEXT NOT NULL UNIQUE,
                password            TEXT NOT NULL,
                role                TEXT NOT NULL CHECK (role IN ('jobseeker', 'recruiter')),
                otp                 TEXT,
                otp_expires_at      TEXT,
                is_verified         INTEGER NOT NULL DEFAULT 0,
                phone               TEXT,
                address             TEXT,
                skills              TEXT NOT NULL DEFAULT '[]',
                education           TEXT NOT NULL DEFAULT '[]',
                experience          TEXT NOT NULL DEFAULT '[]',
                company             TEXT,
                company_website     TEXT,
                total_jobs_posted   INTEGER NOT NULL DEFAULT 0,
                profile_image       TEXT,
                resume              TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE jobs (
                id                  TEXT PRIMARY KEY,
                recruiter_id        TEXT NOT NULL REFERENCES users(id),
                title               TEXT NOT NULL,
                description         TEXT NOT NULL,
                location            TEXT NOT NULL,
                company             TEXT NOT NULL,
                salary              TEXT,
                experience          TEXT,
                skills_required     TEXT NOT NULL DEFAULT '[]',
                employment_type     TEXT,
                responsibility      TEXT NOT NULL DEFAULT '[]',
                status              TEXT NOT NULL DEFAULT 'open',
                close_date          TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX idx_jobs_recruiter ON jobs(recruiter_id, created_at);
            CREATE INDEX idx_jobs_created ON jobs(created_at);

            -- No foreign key on job_id: the pipeline removes a job's applications.
            CREATE TABLE applications (
                id                  TEXT PRIMARY KEY,
                job_id              TEXT NOT NULL,
                applicant_id        TEXT NOT NULL REFERENCES users(id),
                resume              TEXT NOT NULL DEFAULT '',
                status              TEXT NOT NULL DEFAULT 'Applied',
                interview_date      TEXT,
                interview_time      TEXT,
                interview_mode      TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                UNIQUE(job_id, applicant_id)
            );

            CREATE INDEX idx_applications_applicant ON applications(applicant_id, created_at);

            CREATE TABLE application_timeline (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                application_id      TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
                status              TEXT NOT NULL,
                at                  TEXT NOT NULL
            );

            CREATE INDEX idx_timeline_application ON application_timeline(application_id, id);

            CREATE TABLE saved_jobs (
                user_id             TEXT NOT NULL REFERENCES users(id),
                job_id              TEXT NOT NULL,
                saved_at            TEXT NOT NULL,
                PRIMARY KEY (user_id, job_id)
            );

            CREATE TABLE sessions (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT REFERENCES users(id),
                token               TEXT,
                pending_email       TEXT,
                created_at          TEXT NOT NULL,
                expires_at          TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_expiry ON sessions(expires_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
