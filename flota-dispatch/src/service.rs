use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use flota_core::{CallerContext, DispatchError, DispatchResult};

use crate::block::{self, BlockState};
use crate::models::{FinishRequest, NewTrip, StartRequest, Trip, TripStatus};
use crate::repository::{DispatchRepository, TripFilter};

/// Answer for the start-request status query, in priority order: a live
/// pending request beats an active block beats nothing.
#[derive(Debug, Clone)]
pub enum StartRequestStanding {
    Pending(StartRequest),
    Blocked {
        remaining_days: i64,
        reason: Option<String>,
    },
    None,
}

/// Orchestrates the trip approval workflow. All guards that do not need
/// transactional isolation run here; the repository re-checks the ones
/// that do inside its transactions.
pub struct DispatchService {
    repo: Arc<dyn DispatchRepository>,
    default_block_days: i64,
}

impl DispatchService {
    pub fn new(repo: Arc<dyn DispatchRepository>, default_block_days: i64) -> Self {
        Self {
            repo,
            default_block_days,
        }
    }

    // -- trip registry ---------------------------------------------------

    pub async fn create_trip(&self, caller: &CallerContext, params: NewTrip) -> DispatchResult<Trip> {
        caller.require_admin()?;
        validate_trip_params(&params)?;
        let trip = Trip::new(params);
        self.repo.insert_trip(&trip).await?;
        tracing::info!(trip_id = %trip.id, trip_number = %trip.trip_number, "trip registered");
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: Uuid) -> DispatchResult<Trip> {
        self.repo
            .trip_by_id(trip_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el viaje no existe"))
    }

    pub async fn list_trips(&self, filter: &TripFilter) -> DispatchResult<Vec<Trip>> {
        self.repo.list_trips(filter).await
    }

    /// Route, assignment and schedule are editable while the trip is still
    /// pending. A trip already moving keeps its paperwork frozen.
    pub async fn update_trip(
        &self,
        caller: &CallerContext,
        trip_id: Uuid,
        changes: NewTrip,
    ) -> DispatchResult<Trip> {
        caller.require_admin()?;
        validate_trip_params(&changes)?;
        let trip = self.get_trip(trip_id).await?;
        if trip.status != TripStatus::Pending {
            return Err(DispatchError::InvalidState(format!(
                "solo se puede editar un viaje pendiente (status actual: {})",
                trip.status
            )));
        }
        self.repo.update_trip(trip_id, &changes).await
    }

    pub async fn cancel_trip(&self, caller: &CallerContext, trip_id: Uuid) -> DispatchResult<Trip> {
        caller.require_admin()?;
        let trip = self.repo.cancel_trip(trip_id).await?;
        tracing::info!(trip_id = %trip_id, "trip cancelled");
        Ok(trip)
    }

    // -- start-request flow ----------------------------------------------

    pub async fn request_start(
        &self,
        caller: &CallerContext,
        trip_id: Uuid,
    ) -> DispatchResult<StartRequest> {
        let trip = self.get_trip(trip_id).await?;

        if trip.status != TripStatus::Pending {
            return Err(DispatchError::InvalidState(format!(
                "el viaje {} no esta pendiente (status actual: {})",
                trip.trip_number, trip.status
            )));
        }
        if !trip.is_open_to(caller.user_id) {
            return Err(DispatchError::Forbidden(
                "el viaje esta asignado a otro transportista".into(),
            ));
        }
        if let Some(active) = self.repo.active_trip_for_driver(caller.user_id).await? {
            return Err(DispatchError::Conflict(format!(
                "ya tienes un viaje en ruta ({})",
                active
            )));
        }

        // Cooldown left by a prior denial, evaluated against the stored
        // expiry; nothing clears it in the background.
        let denied = self
            .repo
            .latest_denied_start_request(trip_id, caller.user_id)
            .await?;
        if let BlockState::Active {
            remaining_days,
            reason,
        } = block::evaluate(denied.as_ref(), Utc::now())
        {
            return Err(DispatchError::Blocked {
                remaining_days,
                reason,
            });
        }

        if self.repo.pending_start_request(trip_id).await?.is_some() {
            return Err(DispatchError::Conflict(
                "ya existe una solicitud de inicio pendiente para este viaje".into(),
            ));
        }

        let request = StartRequest::new(trip_id, caller.user_id);
        self.repo.insert_start_request(&request).await?;
        tracing::info!(trip_id = %trip_id, driver_id = %caller.user_id, "start request filed");
        Ok(request)
    }

    pub async fn approve_start(
        &self,
        caller: &CallerContext,
        trip_id: Uuid,
    ) -> DispatchResult<StartRequest> {
        caller.require_admin()?;
        let request = self.repo.approve_start(trip_id, caller.user_id).await?;
        tracing::info!(
            trip_id = %trip_id,
            driver_id = %request.driver_id,
            responder_id = %caller.user_id,
            "start request approved, trip en route"
        );
        Ok(request)
    }

    pub async fn reject_start(
        &self,
        caller: &CallerContext,
        trip_id: Uuid,
        reason: &str,
        block_days: Option<i64>,
    ) -> DispatchResult<StartRequest> {
        caller.require_admin()?;
        let reason = non_empty_reason(reason)?;
        let block_days = block_days.unwrap_or(self.default_block_days);
        if block_days < 1 {
            return Err(DispatchError::InvalidInput(
                "dias_bloqueo debe ser al menos 1".into(),
            ));
        }
        let request = self
            .repo
            .reject_start(trip_id, caller.user_id, reason, block_days)
            .await?;
        tracing::info!(
            trip_id = %trip_id,
            driver_id = %request.driver_id,
            responder_id = %caller.user_id,
            block_days,
            "start request denied, cooldown installed"
        );
        Ok(request)
    }

    /// Status query behind `verificar_solicitud`. `driver_id` lets an
    /// administrator inspect another driver's standing; it defaults to the
    /// caller.
    pub async fn start_request_standing(
        &self,
        caller: &CallerContext,
        trip_id: Uuid,
        driver_id: Option<Uuid>,
    ) -> DispatchResult<StartRequestStanding> {
        let driver_id = driver_id.unwrap_or(caller.user_id);
        // Existence check keeps the query honest about missing trips.
        self.get_trip(trip_id).await?;

        if let Some(pending) = self.repo.pending_start_request(trip_id).await? {
            if pending.driver_id == driver_id {
                return Ok(StartRequestStanding::Pending(pending));
            }
        }

        let denied = self
            .repo
            .latest_denied_start_request(trip_id, driver_id)
            .await?;
        if let BlockState::Active {
            remaining_days,
            reason,
        } = block::evaluate(denied.as_ref(), Utc::now())
        {
            return Ok(StartRequestStanding::Blocked {
                remaining_days,
                reason,
            });
        }

        Ok(StartRequestStanding::None)
    }

    // -- finish-request flow ---------------------------------------------

    pub async fn request_finish(
        &self,
        caller: &CallerContext,
        trip_id: Uuid,
    ) -> DispatchResult<FinishRequest> {
        let trip = self.get_trip(trip_id).await?;

        if trip.status != TripStatus::EnRoute {
            return Err(DispatchError::InvalidState(format!(
                "el viaje {} no esta en ruta (status actual: {})",
                trip.trip_number, trip.status
            )));
        }
        match trip.driver_id {
            Some(assigned) if assigned == caller.user_id => {}
            _ => {
                return Err(DispatchError::Forbidden(
                    "solo el transportista asignado puede solicitar la finalizacion".into(),
                ))
            }
        }
        if self.repo.pending_finish_request(trip_id).await?.is_some() {
            return Err(DispatchError::Conflict(
                "ya existe una solicitud de finalizacion pendiente para este viaje".into(),
            ));
        }

        let request = FinishRequest::new(trip_id, caller.user_id);
        self.repo.insert_finish_request(&request).await?;
        tracing::info!(trip_id = %trip_id, driver_id = %caller.user_id, "finish request filed");
        Ok(request)
    }

    pub async fn approve_finish(
        &self,
        caller: &CallerContext,
        trip_id: Uuid,
    ) -> DispatchResult<FinishRequest> {
        caller.require_admin()?;
        let request = self.repo.approve_finish(trip_id, caller.user_id).await?;
        tracing::info!(
            trip_id = %trip_id,
            driver_id = %request.driver_id,
            responder_id = %caller.user_id,
            "finish request approved, trip completed"
        );
        Ok(request)
    }

    pub async fn reject_finish(
        &self,
        caller: &CallerContext,
        trip_id: Uuid,
        reason: &str,
    ) -> DispatchResult<()> {
        caller.require_admin()?;
        let reason = non_empty_reason(reason)?;
        self.repo
            .reject_finish(trip_id, caller.user_id, reason)
            .await?;
        tracing::info!(
            trip_id = %trip_id,
            responder_id = %caller.user_id,
            "finish request denied and removed, trip stays en route"
        );
        Ok(())
    }

    /// Latest finish request for the trip, answered or not. History stays
    /// informative until the next request replaces it.
    pub async fn finish_request_status(
        &self,
        trip_id: Uuid,
    ) -> DispatchResult<Option<FinishRequest>> {
        self.get_trip(trip_id).await?;
        self.repo.latest_finish_request(trip_id).await
    }
}

fn validate_trip_params(params: &NewTrip) -> DispatchResult<()> {
    for (field, value) in [
        ("origin.state", &params.origin.state),
        ("origin.municipality", &params.origin.municipality),
        ("destination.state", &params.destination.state),
        ("destination.municipality", &params.destination.municipality),
    ] {
        if value.trim().is_empty() {
            return Err(DispatchError::InvalidInput(format!(
                "{} es obligatorio",
                field
            )));
        }
    }
    if let Some(number) = &params.trip_number {
        if number.trim().is_empty() {
            return Err(DispatchError::InvalidInput(
                "numero de viaje no puede estar vacio".into(),
            ));
        }
    }
    Ok(())
}

fn non_empty_reason(reason: &str) -> DispatchResult<&str> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(DispatchError::InvalidInput(
            "el motivo de rechazo es obligatorio".into(),
        ));
    }
    Ok(trimmed)
}
