use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use flota_core::CallerContext;
use flota_registry::models::{NewVehicle, Vehicle};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListVehiclesParams {
    #[serde(default)]
    pub include_inactive: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", post(register_vehicle).get(list_vehicles))
        .route("/vehicles/{id}", get(get_vehicle))
        .route("/vehicles/{id}/deactivate", post(deactivate_vehicle))
}

/// POST /vehicles
async fn register_vehicle(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<NewVehicle>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    let vehicle = state.registry.register_vehicle(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /vehicles?include_inactive=
async fn list_vehicles(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Query(params): Query<ListVehiclesParams>,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
    let vehicles = state
        .registry
        .list_vehicles(!params.include_inactive)
        .await?;
    Ok(Json(vehicles))
}

/// GET /vehicles/{id}
async fn get_vehicle(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
    let vehicle = state.registry.get_vehicle(vehicle_id).await?;
    Ok(Json(vehicle))
}

/// POST /vehicles/{id}/deactivate
async fn deactivate_vehicle(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
    let vehicle = state
        .registry
        .deactivate_vehicle(&caller, vehicle_id)
        .await?;
    Ok(Json(vehicle))
}
