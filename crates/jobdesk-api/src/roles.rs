//! Role resolution and per-operation authorization.
//!
//! A user's role is decided by which profile row exists for them, checked
//! employer-first. Nothing else (no groups, no role column) is consulted.

use jobdesk_db::Database;
use jobdesk_db::models::{ApplicationRow, EmployerProfileRow, JobRow, SeekerProfileRow};
use jobdesk_types::models::{LOGIN_PATH, Role};
use tracing::warn;

use crate::error::ApiError;

/// The authenticated identity together with the profile that gives it a role.
#[derive(Debug, Clone)]
pub enum Actor {
    Employer(EmployerProfileRow),
    JobSeeker(SeekerProfileRow),
    Unassigned,
}

impl Actor {
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Employer(_) => Some(Role::Employer),
            Self::JobSeeker(_) => Some(Role::JobSeeker),
            Self::Unassigned => None,
        }
    }

    /// Require the employer capability.
    pub fn employer(self) -> Result<EmployerProfileRow, ApiError> {
        match self {
            Self::Employer(profile) => Ok(profile),
            _ => Err(ApiError::PermissionDenied {
                redirect: LOGIN_PATH,
            }),
        }
    }

    /// Require the job seeker capability.
    pub fn seeker(self) -> Result<SeekerProfileRow, ApiError> {
        match self {
            Self::JobSeeker(profile) => Ok(profile),
            _ => Err(ApiError::PermissionDenied {
                redirect: LOGIN_PATH,
            }),
        }
    }
}

pub fn resolve(db: &Database, user_id: &str) -> Result<Actor, ApiError> {
    if let Some(profile) = db.get_employer_profile(user_id)? {
        return Ok(Actor::Employer(profile));
    }
    if let Some(profile) = db.get_seeker_profile(user_id)? {
        return Ok(Actor::JobSeeker(profile));
    }
    Ok(Actor::Unassigned)
}

pub fn ensure_owns_job(employer: &EmployerProfileRow, job: &JobRow) -> Result<(), ApiError> {
    if job.employer_id != employer.id {
        warn!("Employer {} denied access to job {}", employer.id, job.id);
        return Err(ApiError::PermissionDenied {
            redirect: Role::Employer.dashboard_path(),
        });
    }
    Ok(())
}

pub fn ensure_owns_application(
    employer: &EmployerProfileRow,
    application: &ApplicationRow,
) -> Result<(), ApiError> {
    if application.employer_id != employer.id {
        warn!(
            "Employer {} denied access to application {}",
            employer.id, application.id
        );
        return Err(ApiError::PermissionDenied {
            redirect: Role::Employer.dashboard_path(),
        });
    }
    Ok(())
}
