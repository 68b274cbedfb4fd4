use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use jobdesk_db::Database;
use jobdesk_db::models::{EmployerProfileRow, JobRow, NewJob};
use jobdesk_types::api::{Claims, Flash, JobActionResponse, JobFormResponse, JobRequest};
use jobdesk_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::forms::JobForm;
use crate::roles::{self, ensure_owns_job};
use crate::{run_blocking, views};

/// New postings are always active.
pub fn create(db: &Database, employer: &EmployerProfileRow, form: &JobForm) -> Result<JobRow, ApiError> {
    let job = db.insert_job(
        &Uuid::new_v4().to_string(),
        &employer.id,
        &NewJob {
            title: &form.title,
            description: &form.description,
            location: &form.location,
        },
    )?;

    info!("Employer {} posted job {} ({})", employer.id, job.id, job.title);
    Ok(job)
}

/// Look up a posting and require that `employer` owns it.
pub fn load_owned(db: &Database, employer: &EmployerProfileRow, job_id: Uuid) -> Result<JobRow, ApiError> {
    let job = db
        .get_job(&job_id.to_string())?
        .ok_or(ApiError::NotFound("Job"))?;
    ensure_owns_job(employer, &job)?;
    Ok(job)
}

/// Leaves `is_active` untouched unless the form sets it.
pub fn update(
    db: &Database,
    employer: &EmployerProfileRow,
    job_id: Uuid,
    form: &JobForm,
) -> Result<JobRow, ApiError> {
    let job = load_owned(db, employer, job_id)?;

    let updated = db
        .update_job(
            &job.id,
            &NewJob {
                title: &form.title,
                description: &form.description,
                location: &form.location,
            },
            form.is_active.unwrap_or(job.is_active),
        )?
        .ok_or(ApiError::NotFound("Job"))?;

    info!("Employer {} updated job {}", employer.id, updated.id);
    Ok(updated)
}

/// Returns the deleted posting. Its applications and interviews are gone too.
pub fn delete(db: &Database, employer: &EmployerProfileRow, job_id: Uuid) -> Result<JobRow, ApiError> {
    let job = load_owned(db, employer, job_id)?;

    if !db.delete_job(&job.id)? {
        return Err(ApiError::NotFound("Job"));
    }

    info!("Employer {} deleted job {}", employer.id, job.id);
    Ok(job)
}

// -- Handlers --

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<JobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = run_blocking(&state, move |state| {
        let employer = roles::resolve(&state.db, &claims.sub.to_string())?.employer()?;
        let form = JobForm::clean(req)?;
        create(&state.db, &employer, &form)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(JobActionResponse {
            message: "Job posted successfully!".into(),
            redirect: Role::Employer.dashboard_path().into(),
            job: views::job(&job),
        }),
    ))
}

/// GET on the update path: current values for the edit form.
pub async fn edit_job_form(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<JobFormResponse>, ApiError> {
    let job = run_blocking(&state, move |state| {
        let employer = roles::resolve(&state.db, &claims.sub.to_string())?.employer()?;
        load_owned(&state.db, &employer, job_id)
    })
    .await?;

    Ok(Json(JobFormResponse {
        title: format!("Update Job: {}", job.title),
        job: views::job(&job),
    }))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<JobRequest>,
) -> Result<Json<JobActionResponse>, ApiError> {
    let job = run_blocking(&state, move |state| {
        let employer = roles::resolve(&state.db, &claims.sub.to_string())?.employer()?;
        let form = JobForm::clean(req)?;
        update(&state.db, &employer, job_id, &form)
    })
    .await?;

    Ok(Json(JobActionResponse {
        message: format!("Job '{}' updated successfully.", job.title),
        redirect: Role::Employer.dashboard_path().into(),
        job: views::job(&job),
    }))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Flash>, ApiError> {
    let job = run_blocking(&state, move |state| {
        let employer = roles::resolve(&state.db, &claims.sub.to_string())?.employer()?;
        delete(&state.db, &employer, job_id)
    })
    .await?;

    Ok(Json(Flash {
        message: format!("Job '{}' deleted.", job.title),
        redirect: Role::Employer.dashboard_path().into(),
    }))
}
