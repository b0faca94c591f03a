use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flota_core::DispatchError;
use serde_json::json;

/// API-level error. Domain failures map onto HTTP statuses here; everything
/// the services raise is already worded for the caller, so the body just
/// carries the message through.
#[derive(Debug)]
pub enum ApiError {
    Dispatch(DispatchError),
    Internal(String),
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self::Dispatch(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Dispatch(err) => dispatch_response(err),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "error interno del servidor",
                )
            }
        }
    }
}

fn dispatch_response(err: DispatchError) -> Response {
    match err {
        DispatchError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, &msg),
        DispatchError::InvalidState(msg) => error_response(StatusCode::CONFLICT, &msg),
        DispatchError::Forbidden(msg) => error_response(StatusCode::FORBIDDEN, &msg),
        DispatchError::Conflict(msg) => error_response(StatusCode::CONFLICT, &msg),
        DispatchError::InvalidInput(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
        DispatchError::Blocked {
            remaining_days,
            reason,
        } => {
            let body = Json(json!({
                "error": format!("solicitud bloqueada, {} dia(s) restantes", remaining_days),
                "bloqueado": true,
                "dias_restantes": remaining_days,
                "motivo": reason,
            }));
            (StatusCode::LOCKED, body).into_response()
        }
        DispatchError::Storage(source) => {
            tracing::error!("Storage error: {}", source);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "error interno del servidor",
            )
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_maps_to_locked() {
        let err = ApiError::from(DispatchError::Blocked {
            remaining_days: 3,
            reason: Some("unidad en taller".to_string()),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::LOCKED);
    }

    #[test]
    fn test_storage_hides_details() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = ApiError::from(DispatchError::storage(io));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
