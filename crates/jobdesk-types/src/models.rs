use serde::{Deserialize, Serialize};

/// The two kinds of profile an identity can hold.
///
/// Role is derived from which profile row exists for a user; it is never
/// stored on the user itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "employer")]
    Employer,
    #[serde(rename = "employee")]
    JobSeeker,
}

impl Role {
    /// Where a freshly logged-in user of this role lands.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Self::Employer => "/employer/dashboard/",
            Self::JobSeeker => "/employee/dashboard/",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Employer => "Employer",
            Self::JobSeeker => "Employee",
        }
    }
}

pub const LOGIN_PATH: &str = "/";
pub const RESUME_UPLOAD_PATH: &str = "/employee/resume/upload/";
