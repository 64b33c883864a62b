use super::events::ContextEvent;
use super::states::ContextState;
use crate::store::StoreError;
use thiserror::Error;

/// Error types for context state machine operations
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("Invalid state transition: cannot {event} from {from}")]
    InvalidTransition {
        from: ContextState,
        event: ContextEvent,
    },

    #[error("Guard condition failed for {event}: {reason}")]
    GuardRejected { event: ContextEvent, reason: String },

    #[error("Unknown event: {name}")]
    UnknownEvent { name: String },

    #[error("Guard check failed: {0}")]
    GuardCheckFailed(#[from] GuardError),
}

/// Specific error type for guard condition failures
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Guard lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type GuardResult<T> = Result<T, GuardError>;

/// Helper function to create guard rejections
pub fn guard_rejected(event: ContextEvent, reason: impl Into<String>) -> StateMachineError {
    StateMachineError::GuardRejected {
        event,
        reason: reason.into(),
    }
}
