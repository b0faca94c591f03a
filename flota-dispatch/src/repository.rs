use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{FinishRequest, NewTrip, StartRequest, Trip, TripStatus};
use flota_core::DispatchResult;

/// Listing filter for the trip board.
#[derive(Debug, Clone, Default)]
pub struct TripFilter {
    pub status: Option<TripStatus>,
    pub driver_id: Option<Uuid>,
}

/// Persistence contract for trips and their start/finish requests.
///
/// The approve/reject operations are single methods on purpose: every
/// guard they need runs inside one transaction in the implementation,
/// so a request cannot be answered twice and a trip cannot move under a
/// decision. Concurrent callers race; exactly one wins and the rest get
/// Conflict or InvalidState back.
#[async_trait]
pub trait DispatchRepository: Send + Sync {
    // -- trips -----------------------------------------------------------

    async fn insert_trip(&self, trip: &Trip) -> DispatchResult<()>;

    async fn trip_by_id(&self, trip_id: Uuid) -> DispatchResult<Option<Trip>>;

    async fn list_trips(&self, filter: &TripFilter) -> DispatchResult<Vec<Trip>>;

    async fn update_trip(&self, trip_id: Uuid, changes: &NewTrip) -> DispatchResult<Trip>;

    /// pending or en_route -> cancelled; anything else is InvalidState.
    async fn cancel_trip(&self, trip_id: Uuid) -> DispatchResult<Trip>;

    /// Id of the trip currently en route under this driver, if any.
    async fn active_trip_for_driver(&self, driver_id: Uuid) -> DispatchResult<Option<Uuid>>;

    // -- start requests --------------------------------------------------

    async fn insert_start_request(&self, request: &StartRequest) -> DispatchResult<()>;

    async fn pending_start_request(&self, trip_id: Uuid) -> DispatchResult<Option<StartRequest>>;

    /// Latest denied start request filed by this driver for this trip.
    /// Carries the cooldown window when one was installed.
    async fn latest_denied_start_request(
        &self,
        trip_id: Uuid,
        driver_id: Uuid,
    ) -> DispatchResult<Option<StartRequest>>;

    /// Approve the pending start request and put the trip en route,
    /// atomically.
    async fn approve_start(&self, trip_id: Uuid, responder_id: Uuid)
        -> DispatchResult<StartRequest>;

    /// Deny the pending start request, record the reason and install a
    /// cooldown of `block_days` calendar days. The trip stays pending.
    async fn reject_start(
        &self,
        trip_id: Uuid,
        responder_id: Uuid,
        reason: &str,
        block_days: i64,
    ) -> DispatchResult<StartRequest>;

    // -- finish requests -------------------------------------------------

    /// File a finish request and clear any denial reason left on the trip
    /// by an earlier round, atomically.
    async fn insert_finish_request(&self, request: &FinishRequest) -> DispatchResult<()>;

    async fn pending_finish_request(&self, trip_id: Uuid) -> DispatchResult<Option<FinishRequest>>;

    async fn latest_finish_request(&self, trip_id: Uuid) -> DispatchResult<Option<FinishRequest>>;

    /// Approve the pending finish request and complete the trip,
    /// atomically.
    async fn approve_finish(
        &self,
        trip_id: Uuid,
        responder_id: Uuid,
    ) -> DispatchResult<FinishRequest>;

    /// Deny the pending finish request: store the reason on the trip and
    /// delete the request row. The trip stays en_route and the driver may
    /// file again immediately.
    async fn reject_finish(
        &self,
        trip_id: Uuid,
        responder_id: Uuid,
        reason: &str,
    ) -> DispatchResult<()>;
}
