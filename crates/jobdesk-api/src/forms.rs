//! Input cleaning for every form the service accepts.
//!
//! Each `clean` collects all field errors before failing so the client can
//! show them together.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use jobdesk_types::api::{InterviewRequest, JobRequest, RegisterRequest};
use jobdesk_types::models::Role;
use url::Url;

use crate::error::{ApiError, FieldErrors};

const REQUIRED: &str = "This field is required.";

pub const ALLOWED_RESUME_EXTENSIONS: &[&str] = &["pdf", "docx"];

/// 10 MB upload limit for resumes
pub const MAX_RESUME_SIZE: usize = 10 * 1024 * 1024;

/// Naive formats accepted for interview times, interpreted as UTC.
const NAIVE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
    pub skills: Option<String>,
}

impl RegistrationForm {
    pub fn clean(req: RegisterRequest) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();

        let username = req.username.trim().to_string();
        if username.len() < 3 || username.len() > 32 {
            errors.insert("username", "Username must be between 3 and 32 characters.".into());
        } else if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@.+-_".contains(c))
        {
            errors.insert(
                "username",
                "Enter a valid username. Use letters, numbers and @/./+/-/_ only.".into(),
            );
        }

        if req.password.len() < 8 {
            errors.insert("password", "Password must be at least 8 characters.".into());
        }

        let company_name = optional_text(req.company_name);
        if req.role == Role::Employer {
            match &company_name {
                None => {
                    errors.insert("company_name", REQUIRED.into());
                }
                Some(name) => check_max_len(&mut errors, "company_name", name, 150),
            }
        }

        let skills = clean_skills(&mut errors, req.skills);

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(Self {
            username,
            password: req.password,
            role: req.role,
            company_name,
            company_description: optional_text(req.company_description),
            skills,
        })
    }
}

#[derive(Debug)]
pub struct JobForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub is_active: Option<bool>,
}

impl JobForm {
    pub fn clean(req: JobRequest) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();

        let title = required_text(&mut errors, "title", req.title, Some(200));
        let description = required_text(&mut errors, "description", req.description, None);
        let location = required_text(&mut errors, "location", req.location, Some(100));

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(Self {
            title,
            description,
            location,
            is_active: req.is_active,
        })
    }
}

#[derive(Debug)]
pub struct InterviewForm {
    pub scheduled_time: DateTime<Utc>,
    pub location_link: Option<String>,
    pub notes: Option<String>,
}

impl InterviewForm {
    pub fn clean(req: InterviewRequest) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();

        let scheduled_time = match parse_scheduled_time(&req.scheduled_time) {
            Some(t) => Some(t),
            None if req.scheduled_time.trim().is_empty() => {
                errors.insert("scheduled_time", REQUIRED.into());
                None
            }
            None => {
                errors.insert("scheduled_time", "Enter a valid date/time.".into());
                None
            }
        };

        let location_link = optional_text(req.location_link);
        if let Some(link) = &location_link {
            if link.chars().count() > 255 {
                errors.insert(
                    "location_link",
                    "Ensure this value has at most 255 characters.".into(),
                );
            } else if !is_web_url(link) {
                errors.insert("location_link", "Enter a valid URL.".into());
            }
        }

        match scheduled_time {
            Some(scheduled_time) if errors.is_empty() => Ok(Self {
                scheduled_time,
                location_link,
                notes: optional_text(req.notes),
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

/// Accepts RFC 3339, or the offset-less forms an HTML `datetime-local`
/// input produces.
pub fn parse_scheduled_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ndt| ndt.and_utc())
}

fn is_web_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

/// Validate a resume file name against the extension allow-list and return
/// the normalized extension.
pub fn resume_extension(file_name: &str) -> Result<&'static str, ApiError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    ALLOWED_RESUME_EXTENSIONS
        .iter()
        .find(|allowed| **allowed == ext)
        .copied()
        .ok_or_else(|| {
            ApiError::field(
                "resume",
                format!(
                    "File extension \"{}\" is not allowed. Allowed extensions are: {}.",
                    ext,
                    ALLOWED_RESUME_EXTENSIONS.join(", ")
                ),
            )
        })
}

/// Skills text posted with a resume upload.
pub fn clean_skills_field(raw: String) -> Result<Option<String>, ApiError> {
    let mut errors = FieldErrors::new();
    let skills = clean_skills(&mut errors, Some(raw));
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(skills)
}

fn clean_skills(errors: &mut FieldErrors, raw: Option<String>) -> Option<String> {
    let skills = optional_text(raw);
    if let Some(s) = &skills {
        check_max_len(errors, "skills", s, 255);
    }
    skills
}

fn required_text(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: String,
    max_len: Option<usize>,
) -> String {
    let value = raw.trim().to_string();
    if value.is_empty() {
        errors.insert(field, REQUIRED.into());
    } else if let Some(max) = max_len {
        check_max_len(errors, field, &value, max);
    }
    value
}

fn check_max_len(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.insert(
            field,
            format!("Ensure this value has at most {} characters.", max),
        );
    }
}

fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
