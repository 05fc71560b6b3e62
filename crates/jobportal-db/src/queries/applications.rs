use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

use jobportal_types::ApplicationStatus;
use jobportal_types::models::{InterviewDetail, TimelineEntry};

use super::{OptionalExt, is_unique_violation, parsed};
use crate::Database;
use crate::models::{
    ApplicantBriefRow, ApplicationRow, DashboardCounts, JobBriefRow, NewApplication,
    OwnedApplicationRow,
};

const APPLICATION_COLUMNS: &str = "a.id, a.job_id, a.applicant_id, a.resume, a.status, \
     a.interview_date, a.interview_time, a.interview_mode, a.created_at, a.updated_at";

/// Number of columns in `APPLICATION_COLUMNS`; joined columns start here.
const APPLICATION_WIDTH: usize = 10;

impl Database {
    /// Creates an application in `Applied` with its first timeline entry.
    ///
    /// Returns `None` when the (job, applicant) pair already exists; the
    /// UNIQUE constraint decides, so concurrent applies cannot both win.
    pub fn insert_application(&self, new: &NewApplication<'_>) -> Result<Option<ApplicationRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO applications (id, job_id, applicant_id, resume, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![
                    new.id,
                    new.job_id,
                    new.applicant_id,
                    new.resume,
                    ApplicationStatus::Applied.as_str(),
                    new.created_at,
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
            append_timeline(&tx, new.id, ApplicationStatus::Applied, new.created_at)?;
            tx.commit()?;

            query_application(conn, new.id)
        })
    }

    pub fn find_application(&self, job_id: &str, applicant_id: &str) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {APPLICATION_COLUMNS} FROM applications a
                 WHERE a.job_id = ?1 AND a.applicant_id = ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([job_id, applicant_id], map_application).optional()?;
            with_timeline(conn, row)
        })
    }

    /// Application by id, restricted to the given applicant.
    pub fn get_own_application(&self, id: &str, applicant_id: &str) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {APPLICATION_COLUMNS} FROM applications a
                 WHERE a.id = ?1 AND a.applicant_id = ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id, applicant_id], map_application).optional()?;
            with_timeline(conn, row)
        })
    }

    /// Application joined through its job to the job's owner.
    pub fn get_application_with_owner(&self, id: &str) -> Result<Option<OwnedApplicationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {APPLICATION_COLUMNS}, j.recruiter_id
                 FROM applications a
                 LEFT JOIN jobs j ON j.id = a.job_id
                 WHERE a.id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let found = stmt
                .query_row([id], |row| {
                    Ok((map_application(row)?, row.get::<_, Option<String>>(APPLICATION_WIDTH)?))
                })
                .optional()?;

            match found {
                Some((mut application, owner_id)) => {
                    application.timeline = load_timeline(conn, &application.id)?;
                    Ok(Some(OwnedApplicationRow {
                        application,
                        owner_id,
                    }))
                }
                None => Ok(None),
            }
        })
    }

    /// Writes a status change and/or interview detail in one transaction,
    /// provided the application is still in `expected`. A status change always
    /// appends to the timeline.
    ///
    /// Returns `None` and writes nothing when the application is gone or has
    /// moved away from `expected` since it was read.
    pub fn update_application(
        &self,
        id: &str,
        expected: ApplicationStatus,
        status: Option<ApplicationStatus>,
        interview: Option<&InterviewDetail>,
        at: DateTime<Utc>,
    ) -> Result<Option<ApplicationRow>> {
        let next = status.unwrap_or(expected);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE applications SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
                rusqlite::params![id, expected.as_str(), next.as_str(), at],
            )?;
            if n == 0 {
                return Ok(None);
            }
            if next != expected {
                append_timeline(&tx, id, next, at)?;
            }
            if let Some(detail) = interview {
                tx.execute(
                    "UPDATE applications
                     SET interview_date = ?2, interview_time = ?3, interview_mode = ?4
                     WHERE id = ?1",
                    rusqlite::params![id, detail.date, detail.time, detail.mode],
                )?;
            }
            tx.commit()?;

            query_application(conn, id)
        })
    }

    /// Deletes the applicant's application unless it has reached a stage
    /// that forbids withdrawal. Returns whether a row was removed.
    pub fn withdraw_application(&self, id: &str, applicant_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM applications
                 WHERE id = ?1 AND applicant_id = ?2 AND status NOT IN (?3, ?4)",
                rusqlite::params![
                    id,
                    applicant_id,
                    ApplicationStatus::Interview.as_str(),
                    ApplicationStatus::Hired.as_str(),
                ],
            )?;
            Ok(n == 1)
        })
    }

    pub fn delete_applications_for_job(&self, job_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM applications WHERE job_id = ?1", [job_id])?;
            Ok(n)
        })
    }

    /// The applicant's applications, newest first, with job fields resolved.
    /// The job is `None` for orphans left by an interrupted cascade.
    pub fn list_applications_for_applicant(
        &self,
        applicant_id: &str,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<(ApplicationRow, Option<JobBriefRow>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {APPLICATION_COLUMNS}, j.id, j.title, j.company, j.location
                 FROM applications a
                 LEFT JOIN jobs j ON j.id = a.job_id
                 WHERE a.applicant_id = ?1 AND (?2 IS NULL OR a.status = ?2)
                 ORDER BY a.created_at DESC, a.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![applicant_id, status.map(|s| s.as_str())], |row| {
                    let job = match row.get::<_, Option<String>>(APPLICATION_WIDTH)? {
                        Some(id) => Some(JobBriefRow {
                            id,
                            title: row.get(APPLICATION_WIDTH + 1)?,
                            company: row.get(APPLICATION_WIDTH + 2)?,
                            location: row.get(APPLICATION_WIDTH + 3)?,
                        }),
                        None => None,
                    };
                    Ok((map_application(row)?, job))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            attach_timelines(conn, rows)
        })
    }

    /// A job's applications, newest first, with applicant fields resolved.
    pub fn list_applications_for_job(
        &self,
        job_id: &str,
    ) -> Result<Vec<(ApplicationRow, Option<ApplicantBriefRow>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {APPLICATION_COLUMNS}, u.id, u.name, u.email, u.phone, u.resume
                 FROM applications a
                 LEFT JOIN users u ON u.id = a.applicant_id
                 WHERE a.job_id = ?1
                 ORDER BY a.created_at DESC, a.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([job_id], |row| {
                    let applicant = match row.get::<_, Option<String>>(APPLICATION_WIDTH)? {
                        Some(id) => Some(ApplicantBriefRow {
                            id,
                            name: row.get(APPLICATION_WIDTH + 1)?,
                            email: row.get(APPLICATION_WIDTH + 2)?,
                            phone: row.get(APPLICATION_WIDTH + 3)?,
                            resume: row.get(APPLICATION_WIDTH + 4)?,
                        }),
                        None => None,
                    };
                    Ok((map_application(row)?, applicant))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            attach_timelines(conn, rows)
        })
    }

    /// Counts over every job the recruiter owns, computed on each call.
    pub fn recruiter_dashboard(&self, recruiter_id: &str) -> Result<DashboardCounts> {
        self.with_conn(|conn| {
            let total_jobs: i64 = conn.query_row(
                "SELECT COUNT(*) FROM jobs WHERE recruiter_id = ?1",
                [recruiter_id],
                |row| row.get(0),
            )?;

            let (total, shortlisted, hired): (i64, i64, i64) = conn.query_row(
                "SELECT COUNT(a.id),
                        COALESCE(SUM(a.status = ?2), 0),
                        COALESCE(SUM(a.status = ?3), 0)
                 FROM applications a
                 JOIN jobs j ON j.id = a.job_id
                 WHERE j.recruiter_id = ?1",
                rusqlite::params![
                    recruiter_id,
                    ApplicationStatus::Shortlisted.as_str(),
                    ApplicationStatus::Hired.as_str(),
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            Ok(DashboardCounts {
                total_jobs: total_jobs as u64,
                total_applications: total as u64,
                shortlisted: shortlisted as u64,
                hired: hired as u64,
            })
        })
    }
}

fn query_application(conn: &Connection, id: &str) -> Result<Option<ApplicationRow>> {
    let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications a WHERE a.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([id], map_application).optional()?;
    with_timeline(conn, row)
}

fn with_timeline(conn: &Connection, row: Option<ApplicationRow>) -> Result<Option<ApplicationRow>> {
    match row {
        Some(mut application) => {
            application.timeline = load_timeline(conn, &application.id)?;
            Ok(Some(application))
        }
        None => Ok(None),
    }
}

fn append_timeline(
    conn: &Connection,
    application_id: &str,
    status: ApplicationStatus,
    at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO application_timeline (application_id, status, at) VALUES (?1, ?2, ?3)",
        rusqlite::params![application_id, status.as_str(), at],
    )?;
    Ok(())
}

fn load_timeline(conn: &Connection, application_id: &str) -> Result<Vec<TimelineEntry>> {
    let mut stmt = conn.prepare(
        "SELECT status, at FROM application_timeline WHERE application_id = ?1 ORDER BY id",
    )?;
    let entries = stmt
        .query_map([application_id], |row| {
            Ok(TimelineEntry {
                status: parsed(row, 0)?,
                date: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Batch-loads timelines for a listing instead of one query per row.
fn attach_timelines<T>(
    conn: &Connection,
    rows: Vec<(ApplicationRow, T)>,
) -> Result<Vec<(ApplicationRow, T)>> {
    if rows.is_empty() {
        return Ok(rows);
    }

    let placeholders: Vec<String> = (1..=rows.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT application_id, status, at FROM application_timeline
         WHERE application_id IN ({})
         ORDER BY id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let ids = rows.iter().map(|(a, _)| a.id.as_str());
    let mut by_application: HashMap<String, Vec<TimelineEntry>> = HashMap::new();
    let entries = stmt.query_map(rusqlite::params_from_iter(ids), |row| {
        Ok((
            row.get::<_, String>(0)?,
            TimelineEntry {
                status: parsed(row, 1)?,
                date: row.get(2)?,
            },
        ))
    })?;
    for entry in entries {
        let (application_id, entry) = entry?;
        by_application.entry(application_id).or_default().push(entry);
    }

    Ok(rows
        .into_iter()
        .map(|(mut application, extra)| {
            application.timeline = by_application.remove(&application.id).unwrap_or_default();
            (application, extra)
        })
        .collect())
}

fn map_application(row: &Row<'_>) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        applicant_id: row.get(2)?,
        resume: row.get(3)?,
        status: parsed(row, 4)?,
        interview_date: row.get(5)?,
        interview_time: row.get(6)?,
        interview_mode: row.get(7)?,
        timeline: Vec::new(),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use jobportal_types::Role;
    use uuid::Uuid;

    use super::*;
    use crate::queries::testutil;

    fn apply(db: &Database, job_id: &str, applicant_id: &str, at: DateTime<Utc>) -> Option<ApplicationRow> {
        let id = Uuid::new_v4().to_string();
        db.insert_application(&NewApplication {
            id: &id,
            job_id,
            applicant_id,
            resume: "",
            created_at: at,
        })
        .unwrap()
    }

    #[test]
    fn insert_seeds_timeline_and_rejects_duplicates() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let job = testutil::job(&db, &recruiter, "Backend", Utc::now());

        let application = apply(&db, &job, &seeker, Utc::now()).expect("first apply");
        assert_eq!(application.status, ApplicationStatus::Applied);
        assert_eq!(application.timeline.len(), 1);
        assert_eq!(application.timeline[0].status, ApplicationStatus::Applied);
        assert_eq!(application.timeline[0].date, application.created_at);

        assert!(apply(&db, &job, &seeker, Utc::now()).is_none());
    }

    #[test]
    fn owner_is_resolved_through_the_job() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let job = testutil::job(&db, &recruiter, "Backend", Utc::now());
        let application = apply(&db, &job, &seeker, Utc::now()).unwrap();

        let owned = db.get_application_with_owner(&application.id).unwrap().unwrap();
        assert_eq!(owned.owner_id.as_deref(), Some(recruiter.as_str()));

        db.delete_job(&job).unwrap();
        let orphan = db.get_application_with_owner(&application.id).unwrap().unwrap();
        assert!(orphan.owner_id.is_none());
    }

    #[test]
    fn status_update_appends_timeline_and_records_interview() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let job = testutil::job(&db, &recruiter, "Backend", Utc::now());
        let application = apply(&db, &job, &seeker, Utc::now()).unwrap();

        let detail = InterviewDetail {
            date: NaiveDate::from_ymd_opt(2026, 11, 2),
            time: Some("10:00".into()),
            mode: Some("Zoom".into()),
        };
        let updated = db
            .update_application(
                &application.id,
                ApplicationStatus::Applied,
                Some(ApplicationStatus::Interview),
                Some(&detail),
                Utc::now(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Interview);
        assert_eq!(
            updated.timeline.iter().map(|e| e.status).collect::<Vec<_>>(),
            [ApplicationStatus::Applied, ApplicationStatus::Interview]
        );
        assert_eq!(updated.interview(), Some(detail));
    }

    #[test]
    fn stale_status_writes_nothing() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let job = testutil::job(&db, &recruiter, "Backend", Utc::now());
        let application = apply(&db, &job, &seeker, Utc::now()).unwrap();

        db.update_application(&application.id, ApplicationStatus::Applied, Some(ApplicationStatus::Shortlisted), None, Utc::now())
            .unwrap()
            .unwrap();

        // Read as Applied, but it has since moved to Shortlisted.
        let detail = InterviewDetail {
            date: NaiveDate::from_ymd_opt(2026, 11, 2),
            time: None,
            mode: None,
        };
        let stale = db
            .update_application(
                &application.id,
                ApplicationStatus::Applied,
                Some(ApplicationStatus::Interview),
                Some(&detail),
                Utc::now(),
            )
            .unwrap();
        assert!(stale.is_none());

        let current = db.get_own_application(&application.id, &seeker).unwrap().unwrap();
        assert_eq!(current.status, ApplicationStatus::Shortlisted);
        assert_eq!(current.timeline.len(), 2);
        assert_eq!(current.interview(), None);
    }

    #[test]
    fn update_after_withdraw_is_none() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let job = testutil::job(&db, &recruiter, "Backend", Utc::now());
        let application = apply(&db, &job, &seeker, Utc::now()).unwrap();

        assert!(db.withdraw_application(&application.id, &seeker).unwrap());
        let gone = db
            .update_application(&application.id, ApplicationStatus::Applied, Some(ApplicationStatus::Shortlisted), None, Utc::now())
            .unwrap();
        assert!(gone.is_none());
    }

    #[test]
    fn withdraw_refuses_interview_and_hired() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let job = testutil::job(&db, &recruiter, "Backend", Utc::now());

        let interview = apply(&db, &job, &seeker, Utc::now()).unwrap();
        db.update_application(&interview.id, ApplicationStatus::Applied, Some(ApplicationStatus::Interview), None, Utc::now())
            .unwrap();
        assert!(!db.withdraw_application(&interview.id, &seeker).unwrap());

        db.update_application(&interview.id, ApplicationStatus::Interview, Some(ApplicationStatus::Hired), None, Utc::now())
            .unwrap();
        assert!(!db.withdraw_application(&interview.id, &seeker).unwrap());
        let hired = db.get_own_application(&interview.id, &seeker).unwrap().unwrap();
        assert_eq!(hired.status, ApplicationStatus::Hired);

        db.update_application(&interview.id, ApplicationStatus::Hired, Some(ApplicationStatus::Rejected), None, Utc::now())
            .unwrap();
        assert!(!db.withdraw_application(&interview.id, &recruiter).unwrap());
        assert!(db.withdraw_application(&interview.id, &seeker).unwrap());
        assert!(db.get_own_application(&interview.id, &seeker).unwrap().is_none());

        let other = testutil::job(&db, &recruiter, "Frontend", Utc::now());
        let shortlisted = apply(&db, &other, &seeker, Utc::now()).unwrap();
        db.update_application(&shortlisted.id, ApplicationStatus::Applied, Some(ApplicationStatus::Shortlisted), None, Utc::now())
            .unwrap()
            .unwrap();
        assert!(db.withdraw_application(&shortlisted.id, &seeker).unwrap());
        assert!(db.get_own_application(&shortlisted.id, &seeker).unwrap().is_none());
    }

    #[test]
    fn listings_are_newest_first_with_timelines() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let seeker = testutil::user(&db, "s@example.com", Role::Jobseeker);
        let start = Utc::now();
        let older = testutil::job(&db, &recruiter, "Older", start);
        let newer = testutil::job(&db, &recruiter, "Newer", start);
        apply(&db, &older, &seeker, start).unwrap();
        apply(&db, &newer, &seeker, start + Duration::seconds(5)).unwrap();

        let mine = db.list_applications_for_applicant(&seeker, None).unwrap();
        let titles: Vec<_> = mine.iter().map(|(_, j)| j.as_ref().unwrap().title.clone()).collect();
        assert_eq!(titles, ["Newer", "Older"]);
        assert!(mine.iter().all(|(a, _)| a.timeline.len() == 1));

        let filtered = db
            .list_applications_for_applicant(&seeker, Some(ApplicationStatus::Hired))
            .unwrap();
        assert!(filtered.is_empty());

        let for_job = db.list_applications_for_job(&older).unwrap();
        assert_eq!(for_job.len(), 1);
        assert_eq!(for_job[0].1.as_ref().unwrap().email, "s@example.com");
    }

    #[test]
    fn dashboard_matches_recount() {
        let db = testutil::db();
        let recruiter = testutil::user(&db, "r@example.com", Role::Recruiter);
        let other = testutil::user(&db, "o@example.com", Role::Recruiter);
        let seekers: Vec<_> = (0..3)
            .map(|i| testutil::user(&db, &format!("s{i}@example.com"), Role::Jobseeker))
            .collect();
        let job_a = testutil::job(&db, &recruiter, "A", Utc::now());
        let job_b = testutil::job(&db, &recruiter, "B", Utc::now());
        let foreign = testutil::job(&db, &other, "C", Utc::now());

        let a0 = apply(&db, &job_a, &seekers[0], Utc::now()).unwrap();
        let a1 = apply(&db, &job_a, &seekers[1], Utc::now()).unwrap();
        apply(&db, &job_b, &seekers[2], Utc::now()).unwrap();
        apply(&db, &foreign, &seekers[0], Utc::now()).unwrap();
        db.update_application(&a0.id, ApplicationStatus::Applied, Some(ApplicationStatus::Shortlisted), None, Utc::now())
            .unwrap();
        db.update_application(&a1.id, ApplicationStatus::Applied, Some(ApplicationStatus::Hired), None, Utc::now())
            .unwrap();

        let counts = db.recruiter_dashboard(&recruiter).unwrap();
        assert_eq!(
            counts,
            DashboardCounts {
                total_jobs: 2,
                total_applications: 3,
                shortlisted: 1,
                hired: 1,
            }
        );

        let empty = testutil::user(&db, "e@example.com", Role::Recruiter);
        assert_eq!(db.recruiter_dashboard(&empty).unwrap(), DashboardCounts::default());
    }
}
