use std::collections::HashMap;

use axum::{Extension, Json, extract::State};

use jobdesk_db::Database;
use jobdesk_db::models::{ApplicationRow, EmployerProfileRow, InterviewRow, SeekerProfileRow};
use jobdesk_types::api::{
    ApplicationResponse, Claims, EmployerDashboard, EmployerJobView, SeekerDashboard,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::roles;
use crate::{run_blocking, views};

/// Every posting the employer owns, active or not, with its applications
/// (newest first) and their interviews.
pub fn employer_dashboard(db: &Database, employer: &EmployerProfileRow) -> Result<EmployerDashboard, ApiError> {
    let jobs = db.list_jobs_for_employer(&employer.id)?;

    let job_ids: Vec<String> = jobs.iter().map(|j| j.id.clone()).collect();
    let applications = db.list_applications_for_jobs(&job_ids)?;
    let responses = with_interviews(db, &applications)?;

    // Group by job, preserving the newest-first order of the query
    let mut by_job: HashMap<String, Vec<ApplicationResponse>> = HashMap::new();
    for (row, response) in applications.iter().zip(responses) {
        by_job.entry(row.job_id.clone()).or_default().push(response);
    }

    let jobs = jobs
        .iter()
        .map(|job| EmployerJobView {
            job: views::job(job),
            applications: by_job.remove(&job.id).unwrap_or_default(),
        })
        .collect();

    Ok(EmployerDashboard {
        employer: views::employer_profile(employer),
        jobs,
    })
}

/// Active postings plus the seeker's own applications.
pub fn seeker_dashboard(db: &Database, seeker: &SeekerProfileRow) -> Result<SeekerDashboard, ApiError> {
    let jobs = db.list_active_jobs()?;
    let applications = db.list_applications_for_seeker(&seeker.id)?;
    let applied_job_ids = applications
        .iter()
        .map(|a| views::parse_id(&a.job_id, "job"))
        .collect();

    Ok(SeekerDashboard {
        seeker_profile: views::seeker_profile(seeker),
        jobs: jobs.iter().map(views::job).collect(),
        applications: with_interviews(db, &applications)?,
        applied_job_ids,
    })
}

fn with_interviews(db: &Database, applications: &[ApplicationRow]) -> Result<Vec<ApplicationResponse>, ApiError> {
    let ids: Vec<String> = applications.iter().map(|a| a.id.clone()).collect();
    let interviews: HashMap<String, InterviewRow> = db
        .get_interviews_for_applications(&ids)?
        .into_iter()
        .map(|iv| (iv.application_id.clone(), iv))
        .collect();

    Ok(applications
        .iter()
        .map(|a| views::application(a, interviews.get(&a.id)))
        .collect())
}

// -- Handlers --

pub async fn employer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<EmployerDashboard>, ApiError> {
    let dashboard = run_blocking(&state, move |state| {
        let employer = roles::resolve(&state.db, &claims.sub.to_string())?.employer()?;
        employer_dashboard(&state.db, &employer)
    })
    .await?;

    Ok(Json(dashboard))
}

pub async fn seeker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SeekerDashboard>, ApiError> {
    let dashboard = run_blocking(&state, move |state| {
        let seeker = roles::resolve(&state.db, &claims.sub.to_string())?.seeker()?;
        seeker_dashboard(&state.db, &seeker)
    })
    .await?;

    Ok(Json(dashboard))
}
