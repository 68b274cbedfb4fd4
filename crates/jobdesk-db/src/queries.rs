use crate::models::{
    ApplicationRow, EmployerProfileRow, InterviewRow, JobRow, NewInterview, NewJob, NewProfile,
    SeekerProfileRow, UserRow,
};
use crate::{Database, timestamp_now};
use anyhow::Result;
use jobdesk_types::status::ApplicationStatus;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

const JOB_SELECT: &str = "
    SELECT j.id, j.employer_id, e.company_name, j.title, j.description, j.location,
           j.posted_on, j.is_active
    FROM job_postings j
    JOIN employer_profiles e ON e.id = j.employer_id";

const APPLICATION_SELECT: &str = "
    SELECT a.id, a.job_id, j.title, j.employer_id, a.seeker_id, u.username,
           a.applied_on, a.status
    FROM applications a
    JOIN job_postings j ON j.id = a.job_id
    JOIN seeker_profiles s ON s.id = a.seeker_id
    JOIN users u ON u.id = s.user_id";

const INTERVIEW_SELECT: &str =
    "SELECT id, application_id, scheduled_time, location_link, notes FROM interviews";

/// Result of inserting an application under the (job, seeker) unique constraint.
#[derive(Debug)]
pub enum ApplyOutcome {
    Created(ApplicationRow),
    AlreadyApplied,
}

impl Database {
    // -- Users --

    /// Create a user together with exactly one profile.
    /// Returns false when the username is already taken.
    pub fn create_user_with_profile(
        &self,
        user_id: &str,
        username: &str,
        password_hash: &str,
        profile_id: &str,
        profile: &NewProfile<'_>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, username, password_hash, timestamp_now()],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(false),
                Err(e) => return Err(e.into()),
            }

            match profile {
                NewProfile::Employer {
                    company_name,
                    company_description,
                } => {
                    tx.execute(
                        "INSERT INTO employer_profiles (id, user_id, company_name, company_description)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![profile_id, user_id, company_name, company_description],
                    )?;
                }
                NewProfile::Seeker { skills } => {
                    tx.execute(
                        "INSERT INTO seeker_profiles (id, user_id, skills) VALUES (?1, ?2, ?3)",
                        params![profile_id, user_id, skills],
                    )?;
                }
            }

            tx.commit()?;
            Ok(true)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, password, created_at FROM users WHERE username = ?1",
                    [username],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            password: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, user_id: &str, expires_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, user_id, timestamp_now(), expires_at],
            )?;
            Ok(())
        })
    }

    /// True while the session exists, belongs to the user and has not expired.
    pub fn session_is_live(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM sessions WHERE id = ?1 AND user_id = ?2 AND expires_at > ?3",
                    params![id, user_id, timestamp_now()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Drop every session past its expiry. Returns how many were removed.
    pub fn delete_expired_sessions(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                [timestamp_now()],
            )?;
            Ok(n)
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Profiles --

    pub fn get_employer_profile(&self, user_id: &str) -> Result<Option<EmployerProfileRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, company_name, company_description
                     FROM employer_profiles WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(EmployerProfileRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            company_name: row.get(2)?,
                            company_description: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_seeker_profile(&self, user_id: &str) -> Result<Option<SeekerProfileRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT s.id, s.user_id, u.username, s.skills, s.resume
                     FROM seeker_profiles s
                     JOIN users u ON u.id = s.user_id
                     WHERE s.user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(SeekerProfileRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            username: row.get(2)?,
                            skills: row.get(3)?,
                            resume: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_seeker_profile(
        &self,
        profile_id: &str,
        skills: Option<&str>,
        resume: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE seeker_profiles SET skills = ?2, resume = ?3 WHERE id = ?1",
                params![profile_id, skills, resume],
            )?;
            Ok(())
        })
    }

    // -- Job postings --

    pub fn insert_job(&self, id: &str, employer_id: &str, job: &NewJob<'_>) -> Result<JobRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO job_postings (id, employer_id, title, description, location, posted_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, employer_id, job.title, job.description, job.location, timestamp_now()],
            )?;
            query_job(conn, id)?.ok_or_else(|| anyhow::anyhow!("Job vanished after insert: {}", id))
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| query_job(conn, id))
    }

    /// Overwrite the editable fields of a posting. `posted_on` never changes.
    pub fn update_job(&self, id: &str, job: &NewJob<'_>, is_active: bool) -> Result<Option<JobRow>> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE job_postings SET title = ?2, description = ?3, location = ?4, is_active = ?5
                 WHERE id = ?1",
                params![id, job.title, job.description, job.location, is_active],
            )?;
            if n == 0 {
                return Ok(None);
            }
            query_job(conn, id)
        })
    }

    /// Delete a posting; its applications and their interviews go with it.
    pub fn delete_job(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM job_postings WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    pub fn list_jobs_for_employer(&self, employer_id: &str) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let sql = format!("{JOB_SELECT} WHERE j.employer_id = ?1 ORDER BY j.posted_on DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([employer_id], job_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_active_jobs(&self) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let sql = format!("{JOB_SELECT} WHERE j.is_active = 1 ORDER BY j.posted_on DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], job_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Applications --

    /// Insert a fresh APPLIED application. A second insert for the same
    /// (job, seeker) pair, including one that lost a race, reports
    /// `AlreadyApplied` and leaves the existing row alone.
    pub fn insert_application(&self, id: &str, job_id: &str, seeker_id: &str) -> Result<ApplyOutcome> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO applications (id, job_id, seeker_id, applied_on, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, job_id, seeker_id, timestamp_now(), ApplicationStatus::Applied.as_str()],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(ApplyOutcome::AlreadyApplied),
                Err(e) => return Err(e.into()),
            }

            let row = query_application(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Application vanished after insert: {}", id))?;
            Ok(ApplyOutcome::Created(row))
        })
    }

    pub fn get_application(&self, id: &str) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| query_application(conn, id))
    }

    /// Batch-fetch applications for a set of postings, newest first.
    pub fn list_applications_for_jobs(&self, job_ids: &[String]) -> Result<Vec<ApplicationRow>> {
        if job_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "{APPLICATION_SELECT} WHERE a.job_id IN ({}) ORDER BY a.applied_on DESC",
                placeholders(job_ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(job_ids.iter()), application_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_applications_for_seeker(&self, seeker_id: &str) -> Result<Vec<ApplicationRow>> {
        self.with_conn(|conn| {
            let sql = format!("{APPLICATION_SELECT} WHERE a.seeker_id = ?1 ORDER BY a.applied_on DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([seeker_id], application_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Compare-and-set the status. Returns false when the application is
    /// missing or no longer in `from`.
    pub fn set_application_status(
        &self,
        id: &str,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE applications SET status = ?3 WHERE id = ?1 AND status = ?2",
                params![id, from.as_str(), to.as_str()],
            )?;
            Ok(n > 0)
        })
    }

    pub fn count_applications_for_job(&self, job_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM applications WHERE job_id = ?1",
                [job_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    // -- Interviews --

    pub fn get_interview(&self, application_id: &str) -> Result<Option<InterviewRow>> {
        self.with_conn(|conn| query_interview(conn, application_id))
    }

    /// Batch-fetch interviews for a set of applications.
    pub fn get_interviews_for_applications(&self, application_ids: &[String]) -> Result<Vec<InterviewRow>> {
        if application_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "{INTERVIEW_SELECT} WHERE application_id IN ({})",
                placeholders(application_ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(application_ids.iter()), interview_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Create or edit the interview for an application and move the
    /// application to `status`, atomically. An existing interview keeps its id.
    pub fn schedule_interview(
        &self,
        application_id: &str,
        interview_id: &str,
        interview: &NewInterview<'_>,
        status: ApplicationStatus,
    ) -> Result<InterviewRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO interviews (id, application_id, scheduled_time, location_link, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(application_id) DO UPDATE SET
                     scheduled_time = excluded.scheduled_time,
                     location_link = excluded.location_link,
                     notes = excluded.notes",
                params![
                    interview_id,
                    application_id,
                    interview.scheduled_time,
                    interview.location_link,
                    interview.notes
                ],
            )?;
            tx.execute(
                "UPDATE applications SET status = ?2 WHERE id = ?1",
                params![application_id, status.as_str()],
            )?;

            let row = query_interview(&tx, application_id)?
                .ok_or_else(|| anyhow::anyhow!("Interview vanished after upsert: {}", application_id))?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn count_interviews_for_application(&self, application_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM interviews WHERE application_id = ?1",
                [application_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

fn query_job(conn: &Connection, id: &str) -> Result<Option<JobRow>> {
    let sql = format!("{JOB_SELECT} WHERE j.id = ?1");
    let row = conn.query_row(&sql, [id], job_from_row).optional()?;
    Ok(row)
}

fn query_application(conn: &Connection, id: &str) -> Result<Option<ApplicationRow>> {
    let sql = format!("{APPLICATION_SELECT} WHERE a.id = ?1");
    let row = conn.query_row(&sql, [id], application_from_row).optional()?;
    Ok(row)
}

fn query_interview(conn: &Connection, application_id: &str) -> Result<Option<InterviewRow>> {
    let sql = format!("{INTERVIEW_SELECT} WHERE application_id = ?1");
    let row = conn.query_row(&sql, [application_id], interview_from_row).optional()?;
    Ok(row)
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        employer_id: row.get(1)?,
        company_name: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        location: row.get(5)?,
        posted_on: row.get(6)?,
        is_active: row.get(7)?,
    })
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicationRow> {
    let status: String = row.get(7)?;
    let status = status
        .parse::<ApplicationStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        job_title: row.get(2)?,
        employer_id: row.get(3)?,
        seeker_id: row.get(4)?,
        seeker_username: row.get(5)?,
        applied_on: row.get(6)?,
        status,
    })
}

fn interview_from_row(row: &Row<'_>) -> rusqlite::Result<InterviewRow> {
    Ok(InterviewRow {
        id: row.get(0)?,
        application_id: row.get(1)?,
        scheduled_time: row.get(2)?,
        location_link: row.get(3)?,
        notes: row.get(4)?,
    })
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
