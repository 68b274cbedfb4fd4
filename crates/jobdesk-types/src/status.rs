use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an application sits in the hiring pipeline.
///
/// `Rejected` is a terminal state. No transition currently leads into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Shortlisted,
    Interview,
    Rejected,
}

/// Employer actions that move an application between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Shortlist,
    ScheduleInterview,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Application is already {} and can no longer be shortlisted.", .from.label())]
    CannotShortlist { from: ApplicationStatus },
    #[error("Application must be Shortlisted before scheduling.")]
    NotShortlisted { from: ApplicationStatus },
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "APPLIED",
            Self::Shortlisted => "SHORTLISTED",
            Self::Interview => "INTERVIEW",
            Self::Rejected => "REJECTED",
        }
    }

    /// Human-readable label shown on dashboards.
    pub fn label(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Shortlisted => "Shortlisted",
            Self::Interview => "Interview Scheduled",
            Self::Rejected => "Rejected",
        }
    }

    /// The single place where legal edges of the pipeline are defined.
    ///
    /// Re-shortlisting a shortlisted application and re-scheduling an
    /// interview are both allowed and leave the state where it is.
    pub fn apply(self, transition: Transition) -> Result<Self, TransitionError> {
        use ApplicationStatus::*;

        match (self, transition) {
            (Applied | Shortlisted, Transition::Shortlist) => Ok(Shortlisted),
            (from @ (Interview | Rejected), Transition::Shortlist) => {
                Err(TransitionError::CannotShortlist { from })
            }
            (Shortlisted | Interview, Transition::ScheduleInterview) => Ok(Interview),
            (from @ (Applied | Rejected), Transition::ScheduleInterview) => {
                Err(TransitionError::NotShortlisted { from })
            }
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPLIED" => Ok(Self::Applied),
            "SHORTLISTED" => Ok(Self::Shortlisted),
            "INTERVIEW" => Ok(Self::Interview),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
