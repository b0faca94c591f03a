use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use flota_core::CallerContext;
use flota_dispatch::{
    models::{Location, NewTrip, Trip, TripStatus},
    TripFilter,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct TripBody {
    pub trip_number: Option<String>,
    pub origin: Location,
    pub destination: Location,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
}

impl From<TripBody> for NewTrip {
    fn from(body: TripBody) -> Self {
        NewTrip {
            trip_number: body.trip_number,
            origin: body.origin,
            destination: body.destination,
            driver_id: body.driver_id,
            vehicle_id: body.vehicle_id,
            scheduled_at: body.scheduled_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListTripsParams {
    pub status: Option<TripStatus>,
    pub driver_id: Option<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/{id}", get(get_trip).put(update_trip))
        .route("/trips/{id}/cancel", post(cancel_trip))
}

/// POST /trips
/// Register a trip on the dispatch board
async fn create_trip(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<TripBody>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
    let trip = state.dispatch.create_trip(&caller, body.into()).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// GET /trips?status=&driver_id=
async fn list_trips(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Query(params): Query<ListTripsParams>,
) -> Result<Json<Vec<Trip>>, ApiError> {
    let filter = TripFilter {
        status: params.status,
        driver_id: params.driver_id,
    };
    let trips = state.dispatch.list_trips(&filter).await?;
    Ok(Json(trips))
}

/// GET /trips/{id}
async fn get_trip(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerContext>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Trip>, ApiError> {
    let trip = state.dispatch.get_trip(trip_id).await?;
    Ok(Json(trip))
}

/// PUT /trips/{id}
/// Edit route, assignment or schedule while the trip is still pending
async fn update_trip(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<TripBody>,
) -> Result<Json<Trip>, ApiError> {
    let trip = state
        .dispatch
        .update_trip(&caller, trip_id, body.into())
        .await?;
    Ok(Json(trip))
}

/// POST /trips/{id}/cancel
async fn cancel_trip(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Trip>, ApiError> {
    let trip = state.dispatch.cancel_trip(&caller, trip_id).await?;
    Ok(Json(trip))
}
