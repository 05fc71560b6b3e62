use anyhow::Result;
use chrono::{DateTime, Utc};

use super::jobs::{JOB_COLUMNS, map_job};
use crate::Database;
use crate::models::JobRow;

impl Database {
    /// Idempotent. Returns `true` if the pair was newly added.
    pub fn save_job(&self, user_id: &str, job_id: &str, at: DateTime<Utc>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO saved_jobs (user_id, job_id, saved_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, job_id, at],
            )?;
            Ok(n == 1)
        })
    }

    /// Idempotent. Returns `true` if a pair was removed.
    pub fn unsave_job(&self, user_id: &str, job_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM saved_jobs WHERE user_id = ?1 AND job_id = ?2",
                [user_id, job_id],
            )?;
            Ok(n == 1)
        })
    }

    /// Saved jobs that still exist, most recently saved first.
    pub fn list_saved_jobs(&self, user_id: &str) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOB_COLUMNS}
                 FROM saved_jobs s
                 JOIN jobs j ON j.id = s.job_id
                 WHERE s.user_id = ?1
                 ORDER BY s.saved_at DESC, s.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_job)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jobportal_types::Role;

    use super::*;
    use crate::queries::testutil;

    #[test]
    fn saving_twice_keeps_one_entry() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let job = testutil::job(&db, &recruiter, "Backend", Utc::now());

        assert!(db.save_job(&seeker, &job, Utc::now()).unwrap());
        assert!(!db.save_job(&seeker, &job, Utc::now()).unwrap());
        assert_eq!(db.list_saved_jobs(&seeker).unwrap().len(), 1);

        assert!(db.unsave_job(&seeker, &job).unwrap());
        assert!(!db.unsave_job(&seeker, &job).unwrap());
        assert!(db.list_saved_jobs(&seeker).unwrap().is_empty());
    }

    #[test]
    fn listing_skips_deleted_jobs_and_orders_by_save_time() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let now = Utc::now();
        let first = testutil::job(&db, &recruiter, "First", now);
        let second = testutil::job(&db, &recruiter, "Second", now);
        let gone = testutil::job(&db, &recruiter, "Gone", now);

        db.save_job(&seeker, &second, now).unwrap();
        db.save_job(&seeker, &first, now + Duration::seconds(1)).unwrap();
        db.save_job(&seeker, &gone, now + Duration::seconds(2)).unwrap();
        db.delete_job(&gone).unwrap();

        let saved = db.list_saved_jobs(&seeker).unwrap();
        let titles: Vec<_> = saved.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second"]);
    }
}
