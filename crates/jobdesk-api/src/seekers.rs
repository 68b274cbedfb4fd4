use std::path::Path;

use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use jobdesk_db::Database;
use jobdesk_db::models::SeekerProfileRow;
use jobdesk_types::api::{Claims, ProfileActionResponse};
use jobdesk_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::forms::{self, MAX_RESUME_SIZE};
use crate::roles;
use crate::{run_blocking, views};

/// Resumes live under `{upload_dir}/resumes/`.
const RESUME_SUBDIR: &str = "resumes";

/// What a resume upload form carried. Absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct ProfileUpload {
    pub skills: Option<Option<String>>,
    pub resume: Option<ResumeFile>,
}

#[derive(Debug)]
pub struct ResumeFile {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Read and validate the multipart body. Unknown fields are ignored; a file
/// field with no file selected counts as no upload.
pub async fn read_upload(mut multipart: Multipart) -> Result<ProfileUpload, ApiError> {
    let mut upload = ProfileUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::field("resume", format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "skills" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::field("skills", format!("Malformed upload: {}", e)))?;
                upload.skills = Some(forms::clean_skills_field(text)?);
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::field("resume", format!("Malformed upload: {}", e)))?;

                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let extension = forms::resume_extension(&file_name)?;
                if bytes.is_empty() {
                    return Err(ApiError::field("resume", "The submitted file is empty."));
                }
                if bytes.len() > MAX_RESUME_SIZE {
                    return Err(ApiError::field(
                        "resume",
                        format!("Resume must be at most {} MB.", MAX_RESUME_SIZE / (1024 * 1024)),
                    ));
                }
                upload.resume = Some(ResumeFile {
                    extension,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// Write a resume under `upload_dir` and return the stored reference.
pub async fn store_resume(upload_dir: &Path, file: &ResumeFile) -> Result<String, ApiError> {
    let dir = upload_dir.join(RESUME_SUBDIR);
    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        error!("Failed to create resume directory {}: {}", dir.display(), e);
        anyhow::anyhow!("resume storage unavailable")
    })?;

    let name = format!("{}.{}", Uuid::new_v4(), file.extension);
    let path = dir.join(&name);
    tokio::fs::write(&path, &file.bytes).await.map_err(|e| {
        error!("Failed to write resume {}: {}", path.display(), e);
        anyhow::anyhow!("resume storage unavailable")
    })?;

    Ok(format!("{}/{}", RESUME_SUBDIR, name))
}

/// Delete a stored resume. Only references under the resume directory are
/// touched; failures are logged and otherwise ignored.
pub async fn remove_resume(upload_dir: &Path, reference: &str) {
    if !reference.starts_with(RESUME_SUBDIR) {
        return;
    }
    let path = upload_dir.join(reference);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Failed to remove resume {}: {}", path.display(), e);
    }
}

/// Apply an upload to the profile and return the updated row.
pub fn save_profile(
    db: &Database,
    mut seeker: SeekerProfileRow,
    skills: Option<Option<String>>,
    resume: Option<String>,
) -> Result<SeekerProfileRow, ApiError> {
    if let Some(skills) = skills {
        seeker.skills = skills;
    }
    if let Some(resume) = resume {
        seeker.resume = Some(resume);
    }

    db.update_seeker_profile(&seeker.id, seeker.skills.as_deref(), seeker.resume.as_deref())?;
    Ok(seeker)
}

// -- Handlers --

pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<Json<ProfileActionResponse>, ApiError> {
    let user_id = claims.sub.to_string();
    let seeker = run_blocking(&state, move |state| {
        roles::resolve(&state.db, &user_id)?.seeker()
    })
    .await?;

    let upload = read_upload(multipart).await?;

    let stored = match &upload.resume {
        Some(file) => Some(store_resume(&state.upload_dir, file).await?),
        None => None,
    };

    let previous = seeker.resume.clone();
    let new_resume = stored.clone();
    let saved = run_blocking(&state, move |state| {
        save_profile(&state.db, seeker, upload.skills, new_resume)
    })
    .await;

    let profile = match saved {
        Ok(profile) => profile,
        Err(e) => {
            if let Some(orphan) = &stored {
                remove_resume(&state.upload_dir, orphan).await;
            }
            return Err(e);
        }
    };

    if let (Some(old), Some(_)) = (previous, &stored) {
        remove_resume(&state.upload_dir, &old).await;
    }

    info!("Seeker {} updated profile", profile.id);
    Ok(Json(ProfileActionResponse {
        message: "Resume and profile updated successfully!".into(),
        redirect: Role::JobSeeker.dashboard_path().into(),
        profile: views::seeker_profile(&profile),
    }))
}
