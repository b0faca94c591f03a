use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use flota_core::CallerContext;
use flota_registry::models::{Driver, NewDriver};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListDriversParams {
    /// Deactivated drivers stay out of listings unless asked for.
    #[serde(default)]
    pub include_inactive: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/drivers", post(register_driver).get(list_drivers))
        .route("/drivers/{id}", get(get_driver))
        .route("/drivers/{id}/deactivate", post(deactivate_driver))
}

/// POST /drivers
async fn register_driver(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<NewDriver>,
) -> Result<(StatusCode, Json<Driver>), ApiError> {
    let driver = state.registry.register_driver(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

/// GET /drivers?include_inactive=
async fn list_drivers(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Query(params): Query<ListDriversParams>,
) -> Result<Json<Vec<Driver>>, ApiError> {
    let drivers = state.registry.list_drivers(!params.include_inactive).await?;
    Ok(Json(drivers))
}

/// GET /drivers/{id}
async fn get_driver(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Driver>, ApiError> {
    let driver = state.registry.get_driver(driver_id).await?;
    Ok(Json(driver))
}

/// POST /drivers/{id}/deactivate
async fn deactivate_driver(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Driver>, ApiError> {
    let driver = state.registry.deactivate_driver(&caller, driver_id).await?;
    Ok(Json(driver))
}
