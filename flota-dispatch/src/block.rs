use chrono::{DateTime, Duration, Utc};

use crate::models::StartRequest;

/// Days of cooldown installed by a start-request denial when the
/// administrator does not pick a custom window.
pub const DEFAULT_BLOCK_DAYS: i64 = 10;

const SECS_PER_DAY: i64 = 86_400;

/// Cooldown standing of a driver against a trip, evaluated on demand.
/// Nothing expires blocks in the background; every read recomputes from
/// the stored expiry timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockState {
    /// No denial on file, or the window has lapsed.
    Clear,
    /// The window is still open. `remaining_days` is at least 1.
    Active {
        remaining_days: i64,
        reason: Option<String>,
    },
}

impl BlockState {
    pub fn is_active(&self) -> bool {
        matches!(self, BlockState::Active { .. })
    }
}

/// Whole days left until `expires_at`, rounded up. Any positive remainder
/// counts as a full day, so the result is never 0 while the block holds;
/// once `now` reaches the expiry the result is exactly 0.
pub fn remaining_days(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (expires_at - now).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
}

/// Expiry for a denial issued at `now` with a window of `block_days`
/// calendar days.
pub fn expiry_for(block_days: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(block_days)
}

/// Evaluate the block carried by the latest denied start request, if any.
pub fn evaluate(last_denied: Option<&StartRequest>, now: DateTime<Utc>) -> BlockState {
    let Some(request) = last_denied else {
        return BlockState::Clear;
    };
    let Some(expires_at) = request.block_expires_at else {
        return BlockState::Clear;
    };
    match remaining_days(expires_at, now) {
        0 => BlockState::Clear,
        days => BlockState::Active {
            remaining_days: days,
            reason: request.denial_reason.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestStatus;
    use uuid::Uuid;

    fn denied_request(expires_at: DateTime<Utc>, reason: &str) -> StartRequest {
        let mut request = StartRequest::new(Uuid::new_v4(), Uuid::new_v4());
        request.status = RequestStatus::Denied;
        request.denial_reason = Some(reason.to_string());
        request.block_days = Some(DEFAULT_BLOCK_DAYS);
        request.block_expires_at = Some(expires_at);
        request
    }

    #[test]
    fn test_full_window_counts_every_day() {
        let now = Utc::now();
        assert_eq!(remaining_days(expiry_for(10, now), now), 10);
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let now = Utc::now();
        // 9 days and one second left reads as 10 days.
        let expires = now + Duration::days(9) + Duration::seconds(1);
        assert_eq!(remaining_days(expires, now), 10);
    }

    #[test]
    fn test_last_second_still_counts_as_one_day() {
        let now = Utc::now();
        assert_eq!(remaining_days(now + Duration::seconds(1), now), 1);
    }

    #[test]
    fn test_expiry_instant_reads_zero() {
        let now = Utc::now();
        assert_eq!(remaining_days(now, now), 0);
        assert_eq!(remaining_days(now - Duration::seconds(1), now), 0);
    }

    #[test]
    fn test_evaluate_surfaces_reason_while_active() {
        let now = Utc::now();
        let request = denied_request(expiry_for(3, now), "documentos vencidos");
        match evaluate(Some(&request), now) {
            BlockState::Active {
                remaining_days,
                reason,
            } => {
                assert_eq!(remaining_days, 3);
                assert_eq!(reason.as_deref(), Some("documentos vencidos"));
            }
            other => panic!("expected active block, got {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_clears_after_expiry() {
        let now = Utc::now();
        let request = denied_request(now - Duration::days(1), "unidad en taller");
        assert_eq!(evaluate(Some(&request), now), BlockState::Clear);
        assert_eq!(evaluate(None, now), BlockState::Clear);
    }
}
