use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use flota_core::CallerContext;
use flota_dispatch::StartRequestStanding;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

// ============================================================================
// Request Types (legacy wire format, field names fixed by existing clients)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ViajeIdBody {
    pub viaje_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RechazarInicioBody {
    pub viaje_id: Uuid,
    pub motivo: String,
    pub dias_bloqueo: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RechazarFinalizacionBody {
    pub viaje_id: Uuid,
    pub motivo: String,
}

#[derive(Debug, Deserialize)]
pub struct VerificarSolicitudParams {
    pub viaje_id: Uuid,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct VerificarFinalizacionParams {
    pub viaje_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/viajes/solicitar_inicio", post(solicitar_inicio))
        .route("/viajes/aprobar_inicio", post(aprobar_inicio))
        .route("/viajes/rechazar_inicio", post(rechazar_inicio))
        .route("/viajes/verificar_solicitud", get(verificar_solicitud))
        .route("/viajes/solicitar_finalizacion", post(solicitar_finalizacion))
        .route("/viajes/aprobar_finalizacion", post(aprobar_finalizacion))
        .route("/viajes/rechazar_finalizacion", post(rechazar_finalizacion))
        .route(
            "/viajes/verificar_solicitud_finalizacion",
            get(verificar_solicitud_finalizacion),
        )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /viajes/solicitar_inicio
/// Driver asks permission to depart on a pending trip
async fn solicitar_inicio(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<ViajeIdBody>,
) -> Result<Json<Value>, ApiError> {
    let request = state.dispatch.request_start(&caller, body.viaje_id).await?;
    Ok(Json(json!({ "success": true, "solicitud": request })))
}

/// POST /viajes/aprobar_inicio
/// Back office approves the pending start request, trip goes en route
async fn aprobar_inicio(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<ViajeIdBody>,
) -> Result<Json<Value>, ApiError> {
    let request = state.dispatch.approve_start(&caller, body.viaje_id).await?;
    Ok(Json(json!({ "success": true, "solicitud": request })))
}

/// POST /viajes/rechazar_inicio
/// Back office denies the pending start request and installs the cooldown
async fn rechazar_inicio(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<RechazarInicioBody>,
) -> Result<Json<Value>, ApiError> {
    let request = state
        .dispatch
        .reject_start(&caller, body.viaje_id, &body.motivo, body.dias_bloqueo)
        .await?;
    Ok(Json(json!({ "success": true, "solicitud": request })))
}

/// GET /viajes/verificar_solicitud?viaje_id=&user_id=
/// Standing of a driver on a trip: pending request, active block, or neither
async fn verificar_solicitud(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(params): Query<VerificarSolicitudParams>,
) -> Result<Json<Value>, ApiError> {
    let standing = state
        .dispatch
        .start_request_standing(&caller, params.viaje_id, params.user_id)
        .await?;
    let body = match standing {
        StartRequestStanding::Pending(request) => json!({
            "success": true,
            "estado": "pendiente",
            "solicitud": request,
        }),
        StartRequestStanding::Blocked {
            remaining_days,
            reason,
        } => json!({
            "success": true,
            "estado": "bloqueado",
            "dias_restantes": remaining_days,
            "motivo": reason,
        }),
        StartRequestStanding::None => json!({
            "success": true,
            "estado": "ninguna",
        }),
    };
    Ok(Json(body))
}

/// POST /viajes/solicitar_finalizacion
/// Assigned driver asks to close out a trip already en route
async fn solicitar_finalizacion(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<ViajeIdBody>,
) -> Result<Json<Value>, ApiError> {
    let request = state.dispatch.request_finish(&caller, body.viaje_id).await?;
    Ok(Json(json!({ "success": true, "solicitud": request })))
}

/// POST /viajes/aprobar_finalizacion
/// Back office approves the finish request, trip is completed
async fn aprobar_finalizacion(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<ViajeIdBody>,
) -> Result<Json<Value>, ApiError> {
    let request = state.dispatch.approve_finish(&caller, body.viaje_id).await?;
    Ok(Json(json!({ "success": true, "solicitud": request })))
}

/// POST /viajes/rechazar_finalizacion
/// Back office denies the finish request; the reason is parked on the trip
/// and the request itself is discarded so the driver can re-apply at once
async fn rechazar_finalizacion(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<RechazarFinalizacionBody>,
) -> Result<Json<Value>, ApiError> {
    state
        .dispatch
        .reject_finish(&caller, body.viaje_id, &body.motivo)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /viajes/verificar_solicitud_finalizacion?viaje_id=
/// Latest finish request for the trip, answered or still pending
async fn verificar_solicitud_finalizacion(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Query(params): Query<VerificarFinalizacionParams>,
) -> Result<Json<Value>, ApiError> {
    let request = state.dispatch.finish_request_status(params.viaje_id).await?;
    Ok(Json(json!({ "success": true, "solicitud": request })))
}
