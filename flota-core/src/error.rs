use std::error::Error as StdError;

/// Boxed source for unexpected persistence failures. Repos wrap whatever the
/// driver raised; the API layer logs it and answers with a generic message.
pub type StorageError = Box<dyn StdError + Send + Sync>;

/// Failure taxonomy shared by every workflow and registry operation. All
/// variants except `Storage` carry a message ready to show to the caller.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Trip, request, or registry record absent.
    #[error("{0}")]
    NotFound(String),

    /// Trip is not in the state the operation requires.
    #[error("{0}")]
    InvalidState(String),

    /// Caller is not the assigned driver or lacks the required role.
    #[error("{0}")]
    Forbidden(String),

    /// Duplicate pending request, driver already on an active trip, or a
    /// lost race at approval time.
    #[error("{0}")]
    Conflict(String),

    /// Active re-request cooldown installed by a previous start rejection.
    #[error("solicitud bloqueada, {remaining_days} dia(s) restantes")]
    Blocked {
        remaining_days: i64,
        reason: Option<String>,
    },

    /// Missing or empty required field (e.g. rejection reason).
    #[error("{0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(#[source] StorageError),
}

impl DispatchError {
    /// Wrap a driver-level error without leaking it to the caller.
    pub fn storage<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_display_includes_remaining_days() {
        let err = DispatchError::Blocked {
            remaining_days: 7,
            reason: Some("unidad en taller".to_string()),
        };
        assert!(err.to_string().contains("7 dia(s)"));
    }

    #[test]
    fn test_storage_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = DispatchError::storage(io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
