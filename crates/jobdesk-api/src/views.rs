//! Row → response mapping.

use chrono::{DateTime, Utc};
use jobdesk_db::models::{
    ApplicationRow, EmployerProfileRow, InterviewRow, JobRow, SeekerProfileRow,
};
use jobdesk_types::api::{
    ApplicationResponse, EmployerProfileResponse, InterviewResponse, JobResponse,
    SeekerProfileResponse,
};
use tracing::warn;
use uuid::Uuid;

pub fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::nil()
    })
}

pub fn parse_time(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|e| {
        warn!("Corrupt timestamp '{}': {}", raw, e);
        DateTime::default()
    })
}

pub fn job(row: &JobRow) -> JobResponse {
    JobResponse {
        id: parse_id(&row.id, "job"),
        employer_id: parse_id(&row.employer_id, "employer"),
        company_name: row.company_name.clone(),
        title: row.title.clone(),
        description: row.description.clone(),
        location: row.location.clone(),
        posted_on: parse_time(&row.posted_on),
        is_active: row.is_active,
    }
}

pub fn employer_profile(row: &EmployerProfileRow) -> EmployerProfileResponse {
    EmployerProfileResponse {
        id: parse_id(&row.id, "employer"),
        company_name: row.company_name.clone(),
        company_description: row.company_description.clone(),
    }
}

pub fn seeker_profile(row: &SeekerProfileRow) -> SeekerProfileResponse {
    SeekerProfileResponse {
        id: parse_id(&row.id, "seeker"),
        username: row.username.clone(),
        skills: row.skills.clone(),
        resume: row.resume.clone(),
    }
}

pub fn interview(row: &InterviewRow) -> InterviewResponse {
    InterviewResponse {
        id: parse_id(&row.id, "interview"),
        application_id: parse_id(&row.application_id, "application"),
        scheduled_time: parse_time(&row.scheduled_time),
        location_link: row.location_link.clone(),
        notes: row.notes.clone(),
    }
}

pub fn application(row: &ApplicationRow, interview_row: Option<&InterviewRow>) -> ApplicationResponse {
    ApplicationResponse {
        id: parse_id(&row.id, "application"),
        job_id: parse_id(&row.job_id, "job"),
        job_title: row.job_title.clone(),
        seeker_id: parse_id(&row.seeker_id, "seeker"),
        seeker_username: row.seeker_username.clone(),
        applied_on: parse_time(&row.applied_on),
        status: row.status,
        status_label: row.status.label(),
        interview: interview_row.map(interview),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_timestamps_parse_and_garbage_falls_back() {
        let now = jobdesk_db::timestamp_now();
        assert_eq!(parse_time(&now).to_rfc3339_opts(chrono::SecondsFormat::Micros, true), now);

        assert_eq!(parse_time("2024-01-01 10:00:00"), DateTime::<Utc>::default());
    }
}
