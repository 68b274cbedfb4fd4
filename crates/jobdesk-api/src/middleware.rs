use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use jobdesk_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// Extract and validate the JWT from the Authorization header, and check the
/// session it names has not been logged out.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthenticated)?;

    let claims = decode_claims(bearer.token(), &state.jwt_secret)?;

    let sid = claims.sid.to_string();
    let sub = claims.sub.to_string();
    let live = run_blocking(&state, move |state| Ok(state.db.session_is_live(&sid, &sub)?)).await?;
    if !live {
        debug!("Rejected token for ended session {}", claims.sid);
        return Err(ApiError::Unauthenticated);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthenticated
    })?;

    Ok(token_data.claims)
}
