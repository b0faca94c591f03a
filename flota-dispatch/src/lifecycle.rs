use crate::models::TripStatus;
use flota_core::{DispatchError, DispatchResult};

/// Legal trip transitions.
///
/// pending -> en_route   (start request approved)
/// en_route -> completed (finish request approved)
/// pending | en_route -> cancelled
///
/// completed and cancelled are terminal. Denials never move the trip.
pub fn can_transition(from: TripStatus, to: TripStatus) -> bool {
    use TripStatus::*;
    matches!(
        (from, to),
        (Pending, EnRoute) | (EnRoute, Completed) | (Pending, Cancelled) | (EnRoute, Cancelled)
    )
}

pub fn ensure_transition(from: TripStatus, to: TripStatus) -> DispatchResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(DispatchError::InvalidState(format!(
            "transicion de viaje invalida: {} -> {}",
            from, to
        )))
    }
}

pub fn is_terminal(status: TripStatus) -> bool {
    matches!(status, TripStatus::Completed | TripStatus::Cancelled)
}
