use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{debug, info, warn};
use uuid::Uuid;

use jobdesk_db::Database;
use jobdesk_db::models::{NewProfile, UserRow};
use jobdesk_types::api::{
    Claims, Flash, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use jobdesk_types::models::{LOGIN_PATH, Role};

use crate::error::ApiError;
use crate::forms::RegistrationForm;
use crate::roles;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Root under which uploaded resumes are stored.
    pub upload_dir: PathBuf,
    pub session_ttl: chrono::Duration,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = RegistrationForm::clean(req)?;

    let (user_id, role, token) = run_blocking(&state, move |state| {
        let user_id = create_account(&state.db, &form)?;
        let token = open_session(state, user_id, &form.username)?;
        Ok((user_id, form.role, token))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            role,
            token,
            redirect: role.dashboard_path().to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user, user_id, role, token) = run_blocking(&state, move |state| {
        let user = authenticate(&state.db, &req.username, &req.password)?;
        let role = roles::resolve(&state.db, &user.id)?.role();
        let user_id: Uuid = user
            .id
            .parse()
            .map_err(|e| anyhow::anyhow!("Corrupt user id '{}': {}", user.id, e))?;
        let token = open_session(state, user_id, &user.username)?;
        Ok((user, user_id, role, token))
    })
    .await?;

    let (message, redirect) = match role {
        Some(role) => (
            format!("Welcome back, {} ({})!", user.username, role.label()),
            role.dashboard_path(),
        ),
        // Accounts without a profile still get in; the dashboard will turn them away.
        None => (
            "Logged in, but no employee or employer profile found.".to_string(),
            Role::JobSeeker.dashboard_path(),
        ),
    };

    info!("User {} logged in", user.username);
    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        role,
        token,
        message,
        redirect: redirect.to_string(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Flash>, ApiError> {
    let sid = claims.sid.to_string();
    run_blocking(&state, move |state| Ok(state.db.delete_session(&sid)?)).await?;

    info!("User {} logged out", claims.username);
    Ok(Json(Flash {
        message: "You have been logged out.".into(),
        redirect: LOGIN_PATH.into(),
    }))
}

/// Hash the password and create the user with its single profile.
pub fn create_account(db: &Database, form: &RegistrationForm) -> Result<Uuid, ApiError> {
    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();

    let profile = match form.role {
        Role::Employer => NewProfile::Employer {
            company_name: form.company_name.as_deref().unwrap_or_default(),
            company_description: form.company_description.as_deref(),
        },
        Role::JobSeeker => NewProfile::Seeker {
            skills: form.skills.as_deref(),
        },
    };

    let user_id = Uuid::new_v4();
    let created = db.create_user_with_profile(
        &user_id.to_string(),
        &form.username,
        &password_hash,
        &Uuid::new_v4().to_string(),
        &profile,
    )?;
    if !created {
        return Err(ApiError::Conflict("A user with that username already exists.".into()));
    }

    info!("Registered {} as {}", form.username, form.role.label());
    Ok(user_id)
}

/// Check a username/password pair. Unknown users and wrong passwords are
/// indistinguishable to the caller.
pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<UserRow, ApiError> {
    let Some(user) = db.get_user_by_username(username.trim())? else {
        warn!("Login failed for unknown user {}", username);
        return Err(ApiError::InvalidCredentials);
    };

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("Corrupt password hash for {}: {}", user.username, e))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        warn!("Login failed for {}", user.username);
        return Err(ApiError::InvalidCredentials);
    }

    Ok(user)
}

/// Record a new session and sign a token that names it.
pub fn open_session(state: &AppStateInner, user_id: Uuid, username: &str) -> Result<String, ApiError> {
    let pruned = state.db.delete_expired_sessions()?;
    if pruned > 0 {
        debug!("Pruned {} expired sessions", pruned);
    }

    let session_id = Uuid::new_v4();
    let expires_at = Utc::now() + state.session_ttl;

    state.db.create_session(
        &session_id.to_string(),
        &user_id.to_string(),
        &expires_at.to_rfc3339_opts(SecondsFormat::Micros, true),
    )?;

    create_token(
        &state.jwt_secret,
        Claims {
            sub: user_id,
            sid: session_id,
            username: username.to_string(),
            exp: expires_at.timestamp() as usize,
        },
    )
    .map_err(ApiError::Internal)
}

fn create_token(secret: &str, claims: Claims) -> anyhow::Result<String> {
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
