use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use jobdesk_db::models::{
    ApplicationRow, EmployerProfileRow, InterviewRow, NewInterview, SeekerProfileRow,
};
use jobdesk_db::{ApplyOutcome, Database};
use jobdesk_types::api::{
    ApplicationActionResponse, Claims, InterviewRequest, ScheduleFormResponse,
};
use jobdesk_types::models::Role;
use jobdesk_types::status::Transition;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::forms::InterviewForm;
use crate::roles::{self, ensure_owns_application};
use crate::{run_blocking, views};

/// Submit an application. Inactive postings are hidden from the seeker
/// listing but still accept applications by id.
pub fn apply(db: &Database, seeker: &SeekerProfileRow, job_id: Uuid) -> Result<ApplicationRow, ApiError> {
    let job = db
        .get_job(&job_id.to_string())?
        .ok_or(ApiError::NotFound("Job"))?;

    if !seeker.has_resume() {
        return Err(ApiError::ResumeRequired { job_title: job.title });
    }

    match db.insert_application(&Uuid::new_v4().to_string(), &job.id, &seeker.id)? {
        ApplyOutcome::Created(application) => {
            info!("Seeker {} applied for job {}", seeker.id, job.id);
            Ok(application)
        }
        ApplyOutcome::AlreadyApplied => {
            warn!("Seeker {} already applied for job {}", seeker.id, job.id);
            Err(ApiError::AlreadyApplied)
        }
    }
}

/// Look up an application and require that `employer` owns its posting.
pub fn load_owned(
    db: &Database,
    employer: &EmployerProfileRow,
    application_id: Uuid,
) -> Result<ApplicationRow, ApiError> {
    let application = db
        .get_application(&application_id.to_string())?
        .ok_or(ApiError::NotFound("Application"))?;
    ensure_owns_application(employer, &application)?;
    Ok(application)
}

pub fn shortlist(
    db: &Database,
    employer: &EmployerProfileRow,
    application_id: Uuid,
) -> Result<ApplicationRow, ApiError> {
    let application = load_owned(db, employer, application_id)?;
    shortlist_loaded(db, application)
}

/// Move an already-authorized application to SHORTLISTED. The write only
/// lands if the stored status still matches the one the transition was
/// checked against; otherwise the row is re-read and checked again.
fn shortlist_loaded(db: &Database, mut application: ApplicationRow) -> Result<ApplicationRow, ApiError> {
    loop {
        let next = application.status.apply(Transition::Shortlist).inspect_err(|e| {
            warn!("Refused to shortlist application {}: {}", application.id, e);
        })?;

        if db.set_application_status(&application.id, application.status, next)? {
            info!("Application {} shortlisted", application.id);
            application.status = next;
            return Ok(application);
        }

        debug!("Application {} changed while shortlisting; re-checking", application.id);
        application = db
            .get_application(&application.id)?
            .ok_or(ApiError::NotFound("Application"))?;
    }
}

/// The application and its current interview, for prefilling the schedule
/// form. Fails the same way scheduling would.
pub fn schedule_form(
    db: &Database,
    employer: &EmployerProfileRow,
    application_id: Uuid,
) -> Result<(ApplicationRow, Option<InterviewRow>), ApiError> {
    let application = load_owned(db, employer, application_id)?;
    application.status.apply(Transition::ScheduleInterview)?;

    let interview = db.get_interview(&application.id)?;
    Ok((application, interview))
}

/// Create or edit the interview and move the application to INTERVIEW.
/// The status guard runs before the form is validated.
pub fn schedule(
    db: &Database,
    employer: &EmployerProfileRow,
    application_id: Uuid,
    req: InterviewRequest,
) -> Result<(ApplicationRow, InterviewRow), ApiError> {
    let mut application = load_owned(db, employer, application_id)?;
    let next = application.status.apply(Transition::ScheduleInterview).inspect_err(|e| {
        warn!("Refused to schedule application {}: {}", application.id, e);
    })?;

    let form = InterviewForm::clean(req)?;
    let scheduled_time = form.scheduled_time.to_rfc3339();

    let interview = db.schedule_interview(
        &application.id,
        &Uuid::new_v4().to_string(),
        &NewInterview {
            scheduled_time: &scheduled_time,
            location_link: form.location_link.as_deref(),
            notes: form.notes.as_deref(),
        },
        next,
    )?;

    info!(
        "Interview {} for application {} set to {}",
        interview.id, application.id, interview.scheduled_time
    );
    application.status = next;
    Ok((application, interview))
}

// -- Handlers --

pub async fn apply_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let application = run_blocking(&state, move |state| {
        let seeker = roles::resolve(&state.db, &claims.sub.to_string())?.seeker()?;
        apply(&state.db, &seeker, job_id)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplicationActionResponse {
            message: format!("Successfully applied for '{}'.", application.job_title),
            redirect: Role::JobSeeker.dashboard_path().into(),
            application: views::application(&application, None),
        }),
    ))
}

pub async fn shortlist_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApplicationActionResponse>, ApiError> {
    let (application, interview) = run_blocking(&state, move |state| {
        let employer = roles::resolve(&state.db, &claims.sub.to_string())?.employer()?;
        let application = shortlist(&state.db, &employer, application_id)?;
        let interview = state.db.get_interview(&application.id)?;
        Ok((application, interview))
    })
    .await?;

    Ok(Json(ApplicationActionResponse {
        message: "Application has been Shortlisted.".into(),
        redirect: Role::Employer.dashboard_path().into(),
        application: views::application(&application, interview.as_ref()),
    }))
}

/// GET on the schedule path.
pub async fn schedule_interview_form(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ScheduleFormResponse>, ApiError> {
    let (application, interview) = run_blocking(&state, move |state| {
        let employer = roles::resolve(&state.db, &claims.sub.to_string())?.employer()?;
        schedule_form(&state.db, &employer, application_id)
    })
    .await?;

    Ok(Json(ScheduleFormResponse {
        title: format!("Schedule Interview for {}", application.seeker_username),
        application: views::application(&application, interview.as_ref()),
    }))
}

pub async fn schedule_interview(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<InterviewRequest>,
) -> Result<Json<ApplicationActionResponse>, ApiError> {
    let (application, interview) = run_blocking(&state, move |state| {
        let employer = roles::resolve(&state.db, &claims.sub.to_string())?.employer()?;
        schedule(&state.db, &employer, application_id, req)
    })
    .await?;

    Ok(Json(ApplicationActionResponse {
        message: format!("Interview scheduled for {}.", application.seeker_username),
        redirect: Role::Employer.dashboard_path().into(),
        application: views::application(&application, Some(&interview)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdesk_db::models::NewJob;
    use jobdesk_types::status::{ApplicationStatus, TransitionError};

    use crate::test_support::Fixture;

    fn at(time: &str) -> InterviewRequest {
        InterviewRequest {
            scheduled_time: time.into(),
            location_link: Some("https://meet.example.com/xyz".into()),
            notes: Some("Bring a laptop".into()),
        }
    }

    fn app_uuid(row: &ApplicationRow) -> Uuid {
        row.id.parse().unwrap()
    }

    #[test]
    fn apply_creates_an_applied_application_once() {
        let fx = Fixture::new();
        let seeker = fx.seeker();

        let application = apply(&fx.db, &seeker, fx.job_uuid()).unwrap();
        assert_eq!(application.status, ApplicationStatus::Applied);
        assert_eq!(application.job_id, fx.job_id);

        assert!(matches!(
            apply(&fx.db, &seeker, fx.job_uuid()),
            Err(ApiError::AlreadyApplied)
        ));
        assert_eq!(fx.db.count_applications_for_job(&fx.job_id).unwrap(), 1);
    }

    #[test]
    fn apply_without_resume_creates_nothing() {
        let fx = Fixture::new();

        let err = apply(&fx.db, &fx.bare_seeker(), fx.job_uuid()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please upload your resume first to apply for: Backend Engineer."
        );
        assert_eq!(fx.db.count_applications_for_job(&fx.job_id).unwrap(), 0);
    }

    #[test]
    fn apply_to_missing_job_is_not_found() {
        let fx = Fixture::new();
        assert!(matches!(
            apply(&fx.db, &fx.seeker(), Uuid::new_v4()),
            Err(ApiError::NotFound("Job"))
        ));
    }

    #[test]
    fn apply_to_inactive_job_is_accepted() {
        let fx = Fixture::new();
        let job = fx.job();
        fx.db
            .update_job(
                &job.id,
                &NewJob {
                    title: &job.title,
                    description: &job.description,
                    location: &job.location,
                },
                false,
            )
            .unwrap();

        let application = apply(&fx.db, &fx.seeker(), fx.job_uuid()).unwrap();
        assert_eq!(application.status, ApplicationStatus::Applied);
        assert_eq!(fx.db.count_applications_for_job(&fx.job_id).unwrap(), 1);
    }

    #[test]
    fn shortlist_rechecks_a_status_that_moved() {
        let fx = Fixture::new();
        let employer = fx.employer();
        let stale = apply(&fx.db, &fx.seeker(), fx.job_uuid()).unwrap();
        let id = app_uuid(&stale);

        // Another request shortlists and schedules after `stale` was read
        shortlist(&fx.db, &employer, id).unwrap();
        schedule(&fx.db, &employer, id, at("2030-01-10T09:00")).unwrap();

        assert!(matches!(
            shortlist_loaded(&fx.db, stale),
            Err(ApiError::StateGuard(TransitionError::CannotShortlist {
                from: ApplicationStatus::Interview
            }))
        ));
        let stored = fx.db.get_application(&id.to_string()).unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Interview);
    }

    #[test]
    fn other_employers_cannot_touch_an_application() {
        let fx = Fixture::new();
        let application = apply(&fx.db, &fx.seeker(), fx.job_uuid()).unwrap();
        let id = app_uuid(&application);
        let rival = fx.rival_employer();

        assert!(matches!(
            shortlist(&fx.db, &rival, id),
            Err(ApiError::PermissionDenied { .. })
        ));
        assert!(matches!(
            schedule(&fx.db, &rival, id, at("2030-01-01T09:00")),
            Err(ApiError::PermissionDenied { .. })
        ));

        let stored = fx.db.get_application(&application.id).unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Applied);
        assert_eq!(fx.db.count_interviews_for_application(&application.id).unwrap(), 0);
    }

    #[test]
    fn scheduling_before_shortlisting_changes_nothing() {
        let fx = Fixture::new();
        let application = apply(&fx.db, &fx.seeker(), fx.job_uuid()).unwrap();

        let err = schedule(&fx.db, &fx.employer(), app_uuid(&application), at("2030-01-01T09:00")).unwrap_err();
        assert!(matches!(
            err,
            ApiError::StateGuard(TransitionError::NotShortlisted { .. })
        ));

        let stored = fx.db.get_application(&application.id).unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Applied);
        assert_eq!(fx.db.count_interviews_for_application(&application.id).unwrap(), 0);
    }

    #[test]
    fn rescheduling_updates_the_same_interview() {
        let fx = Fixture::new();
        let employer = fx.employer();
        let application = apply(&fx.db, &fx.seeker(), fx.job_uuid()).unwrap();
        let id = app_uuid(&application);

        shortlist(&fx.db, &employer, id).unwrap();
        let (scheduled, first) = schedule(&fx.db, &employer, id, at("2030-01-01T09:00")).unwrap();
        assert_eq!(scheduled.status, ApplicationStatus::Interview);

        let (_, second) = schedule(&fx.db, &employer, id, at("2030-01-03T15:30")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(views::parse_time(&second.scheduled_time).to_rfc3339(), "2030-01-03T15:30:00+00:00");
        assert_eq!(fx.db.count_interviews_for_application(&application.id).unwrap(), 1);
    }

    #[test]
    fn interviewed_application_cannot_be_shortlisted_again() {
        let fx = Fixture::new();
        let employer = fx.employer();
        let application = apply(&fx.db, &fx.seeker(), fx.job_uuid()).unwrap();
        let id = app_uuid(&application);

        shortlist(&fx.db, &employer, id).unwrap();
        schedule(&fx.db, &employer, id, at("2030-01-01T09:00")).unwrap();

        assert!(matches!(
            shortlist(&fx.db, &employer, id),
            Err(ApiError::StateGuard(TransitionError::CannotShortlist { .. }))
        ));
        let stored = fx.db.get_application(&application.id).unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Interview);
    }

    #[test]
    fn invalid_interview_form_leaves_status_alone() {
        let fx = Fixture::new();
        let employer = fx.employer();
        let application = apply(&fx.db, &fx.seeker(), fx.job_uuid()).unwrap();
        let id = app_uuid(&application);
        shortlist(&fx.db, &employer, id).unwrap();

        let mut req = at("2030-01-01T09:00");
        req.location_link = Some("zoom meeting".into());
        assert!(matches!(
            schedule(&fx.db, &employer, id, req),
            Err(ApiError::Validation(_))
        ));

        let stored = fx.db.get_application(&application.id).unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Shortlisted);
    }

    #[test]
    fn schedule_form_prefills_existing_interview() {
        let fx = Fixture::new();
        let employer = fx.employer();
        let application = apply(&fx.db, &fx.seeker(), fx.job_uuid()).unwrap();
        let id = app_uuid(&application);

        assert!(schedule_form(&fx.db, &employer, id).is_err());

        shortlist(&fx.db, &employer, id).unwrap();
        let (_, none_yet) = schedule_form(&fx.db, &employer, id).unwrap();
        assert!(none_yet.is_none());

        schedule(&fx.db, &employer, id, at("2030-01-01T09:00")).unwrap();
        let (_, existing) = schedule_form(&fx.db, &employer, id).unwrap();
        assert_eq!(existing.unwrap().notes.as_deref(), Some("Bring a laptop"));
    }
}
