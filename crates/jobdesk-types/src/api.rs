use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;
use crate::status::ApplicationStatus;

// -- JWT Claims --

/// Token claims. `sid` names the server-side session backing the token so
/// logging out can revoke it before `exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_description: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub token: String,
    pub redirect: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Option<Role>,
    pub token: String,
    pub message: String,
    pub redirect: String,
}

/// Outcome of an action whose only payload is a flash message and where to
/// go next.
#[derive(Debug, Serialize)]
pub struct Flash {
    pub message: String,
    pub redirect: String,
}

// -- Profiles --

#[derive(Debug, Clone, Serialize)]
pub struct EmployerProfileResponse {
    pub id: Uuid,
    pub company_name: String,
    pub company_description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeekerProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub skills: Option<String>,
    pub resume: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileActionResponse {
    pub message: String,
    pub redirect: String,
    pub profile: SeekerProfileResponse,
}

// -- Jobs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub posted_on: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct JobActionResponse {
    pub message: String,
    pub redirect: String,
    pub job: JobResponse,
}

/// Current values of a posting, used to prefill the edit form.
#[derive(Debug, Serialize)]
pub struct JobFormResponse {
    pub title: String,
    pub job: JobResponse,
}

// -- Applications --

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub seeker_id: Uuid,
    pub seeker_username: String,
    pub applied_on: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    pub interview: Option<InterviewResponse>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationActionResponse {
    pub message: String,
    pub redirect: String,
    pub application: ApplicationResponse,
}

// -- Interviews --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterviewRequest {
    /// RFC 3339, or the `YYYY-MM-DDTHH:MM` form a `datetime-local` input posts.
    pub scheduled_time: String,
    #[serde(default)]
    pub location_link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub location_link: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleFormResponse {
    pub title: String,
    pub application: ApplicationResponse,
}

// -- Dashboards --

#[derive(Debug, Serialize)]
pub struct EmployerJobView {
    #[serde(flatten)]
    pub job: JobResponse,
    pub applications: Vec<ApplicationResponse>,
}

#[derive(Debug, Serialize)]
pub struct EmployerDashboard {
    pub employer: EmployerProfileResponse,
    pub jobs: Vec<EmployerJobView>,
}

#[derive(Debug, Serialize)]
pub struct SeekerDashboard {
    pub seeker_profile: SeekerProfileResponse,
    pub jobs: Vec<JobResponse>,
    pub applications: Vec<ApplicationResponse>,
    pub applied_job_ids: Vec<Uuid>,
}
