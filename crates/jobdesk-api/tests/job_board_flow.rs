use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use jobdesk_api::auth::AppStateInner;
use jobdesk_api::router::router;
use jobdesk_db::Database;

const BOUNDARY: &str = "jobdesk-test-boundary";

struct TestApp {
    app: Router,
    state: Arc<AppStateInner>,
    upload_dir: PathBuf,
    _dir: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().to_path_buf();
        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "integration-secret".into(),
            upload_dir: upload_dir.clone(),
            session_ttl: chrono::Duration::days(1),
        });

        Self {
            app: router(state.clone()),
            state,
            upload_dir,
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn register(&self, body: Value) -> String {
        let (status, body) = self.post("/auth/register", None, body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn register_employer(&self, username: &str, company: &str) -> String {
        self.register(json!({
            "username": username,
            "password": "correct horse battery",
            "role": "employer",
            "company_name": company,
        }))
        .await
    }

    async fn register_seeker(&self, username: &str) -> String {
        self.register(json!({
            "username": username,
            "password": "correct horse battery",
            "role": "employee",
            "skills": "Rust",
        }))
        .await
    }

    async fn upload_resume(&self, token: &str, file_name: &str, contents: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"skills\"\r\n\r\nRust, Tokio\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::post("/employee/resume/upload/")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn post_job(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .post(
                "/employer/jobs/create/",
                Some(token),
                json!({
                    "title": title,
                    "description": "Own the job board backend",
                    "location": "Remote",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["message"], "Job posted successfully!");
        body["job"]["id"].as_str().unwrap().to_string()
    }
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Request::get("/employer/dashboard/")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHENTICATED");
    assert_eq!(body["error"]["redirect"], "/");

    let (status, _) = app.get("/employer/dashboard/", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_routes_each_role_to_its_dashboard() {
    let app = TestApp::new();
    app.register_employer("acme", "Acme").await;
    app.register_seeker("sam").await;

    let (status, body) = app
        .post("/", None, json!({ "username": "acme", "password": "correct horse battery" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "employer");
    assert_eq!(body["redirect"], "/employer/dashboard/");
    assert_eq!(body["message"], "Welcome back, acme (Employer)!");

    let (_, body) = app
        .post("/", None, json!({ "username": "sam", "password": "correct horse battery" }))
        .await;
    assert_eq!(body["redirect"], "/employee/dashboard/");

    let (status, body) = app
        .post("/", None, json!({ "username": "sam", "password": "wrong password" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn login_without_a_profile_is_let_in_but_gated() {
    let app = TestApp::new();
    app.register_seeker("pat").await;
    app.state
        .db
        .with_conn(|conn| {
            conn.execute(
                "DELETE FROM seeker_profiles
                 WHERE user_id = (SELECT id FROM users WHERE username = 'pat')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

    let (status, body) = app
        .post("/", None, json!({ "username": "pat", "password": "correct horse battery" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["role"].is_null());
    assert_eq!(body["message"], "Logged in, but no employee or employer profile found.");
    assert_eq!(body["redirect"], "/employee/dashboard/");

    let token = body["token"].as_str().unwrap();
    let (status, body) = app.get("/employee/dashboard/", token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["redirect"], "/");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new();
    let token = app.register_seeker("sam").await;

    let (status, _) = app.get("/employee/dashboard/", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/logout/", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect"], "/");

    let (status, _) = app.get("/employee/dashboard/", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_are_enforced_per_route() {
    let app = TestApp::new();
    let employer = app.register_employer("acme", "Acme").await;
    let seeker = app.register_seeker("sam").await;

    let (status, body) = app.get("/employer/dashboard/", &seeker).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "PERMISSION_DENIED");

    let (status, _) = app.get("/employee/dashboard/", &employer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/employer/jobs/create/",
            Some(&seeker),
            json!({ "title": "x", "description": "y", "location": "z" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn resume_upload_rejects_disallowed_extensions() {
    let app = TestApp::new();
    let seeker = app.register_seeker("sam").await;

    let (status, body) = app.upload_resume(&seeker, "cv.exe", b"MZ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["resume"].as_str().unwrap().contains("pdf, docx"));

    let (_, dashboard) = app.get("/employee/dashboard/", &seeker).await;
    assert!(dashboard["seeker_profile"]["resume"].is_null());
}

#[tokio::test]
async fn failed_profile_save_leaves_no_stored_resume() {
    let app = TestApp::new();
    let seeker = app.register_seeker("sam").await;
    app.state
        .db
        .with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER refuse_profile_update BEFORE UPDATE ON seeker_profiles
                 BEGIN SELECT RAISE(ABORT, 'profile store unavailable'); END;",
            )?;
            Ok(())
        })
        .unwrap();

    let (status, body) = app.upload_resume(&seeker, "cv.pdf", b"%PDF-1.4").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&body), "INTERNAL_ERROR");

    let resumes = app.upload_dir.join("resumes");
    let leftover = std::fs::read_dir(&resumes)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn hiring_pipeline_end_to_end() {
    let app = TestApp::new();
    let employer = app.register_employer("acme", "Acme").await;
    let rival = app.register_employer("globex", "Globex").await;
    let seeker = app.register_seeker("sam").await;

    let job_id = app.post_job(&employer, "Backend Engineer").await;
    let apply_uri = format!("/employee/apply/{job_id}/");

    // No resume yet
    let (status, body) = app.post(&apply_uri, Some(&seeker), json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), "RESUME_REQUIRED");
    assert_eq!(body["error"]["redirect"], "/employee/resume/upload/");

    let (status, body) = app.upload_resume(&seeker, "cv.pdf", b"%PDF-1.4 resume").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["profile"]["skills"], "Rust, Tokio");
    let resume = body["profile"]["resume"].as_str().unwrap().to_string();
    assert_eq!(
        std::fs::read(app.upload_dir.join(&resume)).unwrap(),
        b"%PDF-1.4 resume"
    );

    let (status, body) = app.post(&apply_uri, Some(&seeker), json!({})).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["application"]["status"], "APPLIED");
    let app_id = body["application"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.post(&apply_uri, Some(&seeker), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ALREADY_APPLIED");

    let (_, dashboard) = app.get("/employee/dashboard/", &seeker).await;
    assert_eq!(dashboard["applied_job_ids"], json!([job_id]));

    // Scheduling requires a shortlist first
    let schedule_uri = format!("/employer/application/schedule/{app_id}/");
    let interview = json!({
        "scheduled_time": "2030-03-04T15:00",
        "location_link": "https://meet.example.com/abc",
    });
    let (status, body) = app.post(&schedule_uri, Some(&employer), interview.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INVALID_STATE");

    let shortlist_uri = format!("/employer/application/shortlist/{app_id}/");
    let (status, _) = app.post(&shortlist_uri, Some(&rival), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post(&shortlist_uri, Some(&employer), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "SHORTLISTED");

    let (status, body) = app.get(&schedule_uri, &employer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Schedule Interview for sam");
    assert!(body["application"]["interview"].is_null());

    let (status, body) = app.post(&schedule_uri, Some(&employer), interview).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["application"]["status"], "INTERVIEW");
    assert_eq!(body["application"]["status_label"], "Interview Scheduled");
    let interview_id = body["application"]["interview"]["id"].clone();

    // Rescheduling edits the same interview
    let (status, body) = app
        .post(
            &schedule_uri,
            Some(&employer),
            json!({ "scheduled_time": "2030-03-05T09:30:00Z", "notes": "Moved" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["interview"]["id"], interview_id);
    assert_eq!(body["application"]["interview"]["notes"], "Moved");
    assert_eq!(app.state.db.count_interviews_for_application(&app_id).unwrap(), 1);

    let (status, body) = app.post(&shortlist_uri, Some(&employer), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INVALID_STATE");

    let (_, dashboard) = app.get("/employer/dashboard/", &employer).await;
    let pipeline = &dashboard["jobs"][0]["applications"];
    assert_eq!(pipeline[0]["seeker_username"], "sam");
    assert_eq!(pipeline[0]["interview"]["id"], interview_id);

    let (_, dashboard) = app.get("/employer/dashboard/", &rival).await;
    assert_eq!(dashboard["jobs"], json!([]));

    // Rival cannot touch the posting; the owner removes it with its pipeline
    let delete_uri = format!("/employer/jobs/delete/{job_id}/");
    let (status, _) = app.post(&delete_uri, Some(&rival), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post(&delete_uri, Some(&employer), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Job 'Backend Engineer' deleted.");

    let (_, dashboard) = app.get("/employee/dashboard/", &seeker).await;
    assert_eq!(dashboard["jobs"], json!([]));
    assert_eq!(dashboard["applications"], json!([]));
    assert!(app.state.db.get_interview(&app_id).unwrap().is_none());
}

#[tokio::test]
async fn deactivated_jobs_leave_the_seeker_listing() {
    let app = TestApp::new();
    let employer = app.register_employer("acme", "Acme").await;
    let seeker = app.register_seeker("sam").await;
    app.upload_resume(&seeker, "cv.docx", b"PK resume").await;

    let job_id = app.post_job(&employer, "Data Engineer").await;
    let update_uri = format!("/employer/jobs/update/{job_id}/");

    let (status, body) = app.get(&update_uri, &employer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Update Job: Data Engineer");

    let (status, body) = app
        .post(
            &update_uri,
            Some(&employer),
            json!({
                "title": "Data Engineer",
                "description": "Pipelines",
                "location": "Berlin",
                "is_active": false,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["is_active"], false);

    let (_, dashboard) = app.get("/employee/dashboard/", &seeker).await;
    assert_eq!(dashboard["jobs"], json!([]));

    // Hidden from the listing, but a direct apply still lands
    let (status, body) = app
        .post(&format!("/employee/apply/{job_id}/"), Some(&seeker), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["application"]["job_title"], "Data Engineer");

    // Still visible to its owner
    let (_, dashboard) = app.get("/employer/dashboard/", &employer).await;
    assert_eq!(dashboard["jobs"][0]["location"], "Berlin");
}
