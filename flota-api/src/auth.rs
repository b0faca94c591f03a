use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use flota_core::{DispatchError, Role};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, middleware::Claims, state::AppState};

#[derive(Debug, Deserialize)]
struct SessionRequest {
    user_id: Uuid,
    role: String,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/session", post(create_session))
}

/// Mints a signed session token. Credential checks belong to the auth
/// collaborator in front of this API; this endpoint issues tokens for
/// already-verified identities.
async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let role = Role::parse(&body.role)
        .ok_or_else(|| ApiError::from(DispatchError::InvalidInput("rol desconocido".to_string())))?;

    let claims = Claims {
        sub: body.user_id.to_string(),
        role: role.as_str().to_string(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token encoding failed: {}", e)))?;

    Ok(Json(SessionResponse { token }))
}
