use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Trip status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TripStatus {
    Pending,
    EnRoute,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Pending => "pending",
            TripStatus::EnRoute => "en_route",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a start or finish request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in the route grid: state and municipality, with an optional
/// free-form place detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub state: String,
    pub municipality: String,
    pub place: Option<String>,
}

impl Location {
    pub fn new(state: impl Into<String>, municipality: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            municipality: municipality.into(),
            place: None,
        }
    }
}

/// A planned or running haul between two locations.
///
/// Columns are flat (origin/destination split into their parts) to match
/// the storage layout; use [`Trip::origin`] and [`Trip::destination`] for
/// the structured view.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub trip_number: String,
    pub origin_state: String,
    pub origin_municipality: String,
    pub origin_place: Option<String>,
    pub destination_state: String,
    pub destination_municipality: String,
    pub destination_place: Option<String>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub status: TripStatus,
    /// Reason recorded on the trip when a finish request is denied.
    pub finish_rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to register a new trip.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub trip_number: Option<String>,
    pub origin: Location,
    pub destination: Location,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(params: NewTrip) -> Self {
        let now = Utc::now();
        let trip_number = params
            .trip_number
            .unwrap_or_else(Self::generate_trip_number);
        Self {
            id: Uuid::new_v4(),
            trip_number,
            origin_state: params.origin.state,
            origin_municipality: params.origin.municipality,
            origin_place: params.origin.place,
            destination_state: params.destination.state,
            destination_municipality: params.destination.municipality,
            destination_place: params.destination.place,
            driver_id: params.driver_id,
            vehicle_id: params.vehicle_id,
            scheduled_at: params.scheduled_at,
            status: TripStatus::Pending,
            finish_rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn origin(&self) -> Location {
        Location {
            state: self.origin_state.clone(),
            municipality: self.origin_municipality.clone(),
            place: self.origin_place.clone(),
        }
    }

    pub fn destination(&self) -> Location {
        Location {
            state: self.destination_state.clone(),
            municipality: self.destination_municipality.clone(),
            place: self.destination_place.clone(),
        }
    }

    /// An unassigned trip is open: any driver may claim it by filing a
    /// start request.
    pub fn is_open_to(&self, driver_id: Uuid) -> bool {
        match self.driver_id {
            Some(assigned) => assigned == driver_id,
            None => true,
        }
    }

    fn generate_trip_number() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("V-{}", hex[..6].to_uppercase())
    }
}

/// A driver's petition to put a trip en route. Denied petitions stay on
/// file; the latest one carries the cooldown window.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StartRequest {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub driver_id: Uuid,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responder_id: Option<Uuid>,
    pub denial_reason: Option<String>,
    pub block_days: Option<i64>,
    pub block_expires_at: Option<DateTime<Utc>>,
}

impl StartRequest {
    pub fn new(trip_id: Uuid, driver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id,
            driver_id,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            responded_at: None,
            responder_id: None,
            denial_reason: None,
            block_days: None,
            block_expires_at: None,
        }
    }
}

/// A driver's petition to close out a trip. Denied petitions are removed
/// outright; only the reason survives, on the trip itself.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FinishRequest {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub driver_id: Uuid,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responder_id: Option<Uuid>,
}

impl FinishRequest {
    pub fn new(trip_id: Uuid, driver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id,
            driver_id,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            responded_at: None,
            responder_id: None,
        }
    }
}
