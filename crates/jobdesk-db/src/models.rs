//! Database row types — these map directly to SQLite rows.
//! Distinct from jobdesk-types API models to keep the DB layer independent.

use jobdesk_types::status::ApplicationStatus;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct EmployerProfileRow {
    pub id: String,
    pub user_id: String,
    pub company_name: String,
    pub company_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SeekerProfileRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub skills: Option<String>,
    pub resume: Option<String>,
}

impl SeekerProfileRow {
    pub fn has_resume(&self) -> bool {
        self.resume.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
}

/// A posting joined with its owner's company name.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub employer_id: String,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub posted_on: String,
    pub is_active: bool,
}

/// An application joined with the posting it targets and the seeker's username.
#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub job_title: String,
    pub employer_id: String,
    pub seeker_id: String,
    pub seeker_username: String,
    pub applied_on: String,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone)]
pub struct InterviewRow {
    pub id: String,
    pub application_id: String,
    pub scheduled_time: String,
    pub location_link: Option<String>,
    pub notes: Option<String>,
}

/// The profile created alongside a new user.
pub enum NewProfile<'a> {
    Employer {
        company_name: &'a str,
        company_description: Option<&'a str>,
    },
    Seeker {
        skills: Option<&'a str>,
    },
}

pub struct NewJob<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
}

pub struct NewInterview<'a> {
    pub scheduled_time: &'a str,
    pub location_link: Option<&'a str>,
    pub notes: Option<&'a str>,
}
