use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::auth::{self, AppState};
use crate::forms::MAX_RESUME_SIZE;
use crate::middleware::require_auth;
use crate::{applications, dashboards, jobs, seekers};

/// Every route the service answers. Cross-cutting layers (CORS, tracing) are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/health", get(health));

    let seeker_routes = Router::new()
        .route("/employee/dashboard/", get(dashboards::seeker))
        .route(
            "/employee/resume/upload/",
            post(seekers::upload_resume)
                // Leave room for the multipart framing and the skills field
                .layer(DefaultBodyLimit::max(MAX_RESUME_SIZE + 64 * 1024)),
        )
        .route("/employee/apply/{job_id}/", post(applications::apply_for_job));

    let employer_routes = Router::new()
        .route("/employer/dashboard/", get(dashboards::employer))
        .route("/employer/jobs/create/", post(jobs::create_job))
        .route(
            "/employer/jobs/update/{job_id}/",
            get(jobs::edit_job_form).post(jobs::update_job),
        )
        .route("/employer/jobs/delete/{job_id}/", post(jobs::delete_job))
        .route(
            "/employer/application/shortlist/{app_id}/",
            post(applications::shortlist_application),
        )
        .route(
            "/employer/application/schedule/{app_id}/",
            get(applications::schedule_interview_form).post(applications::schedule_interview),
        );

    let protected_routes = Router::new()
        .route("/logout/", post(auth::logout))
        .merge(seeker_routes)
        .merge(employer_routes)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
