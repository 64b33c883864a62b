//! Error types for the context core.
//!

use crate::config::ConfigurationError;
use crate::models::core::context::ContextId;
use crate::ordering::ListPositionError;
use crate::state_machine::errors::{GuardError, StateMachineError};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reasons a context name is rejected before persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    NameRequired,
    NameTooLong,
    NameTaken,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameRequired => write!(f, "context must have a name"),
            Self::NameTooLong => write!(f, "context name must be less than 256 characters"),
            Self::NameTaken => write!(f, "already exists"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Validation error: {0}")]
    Validation(ValidationErrorKind),

    #[error("Invalid transition: cannot {event} from {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Transition {event} rejected: {reason}")]
    GuardRejected { event: String, reason: String },

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Position {requested} out of range for a list of {count} contexts")]
    PositionOutOfRange { requested: i32, count: i32 },

    #[error("Context {context_id} not found")]
    NotFound { context_id: ContextId },

    #[error("Store failure: {0}")]
    StoreFailure(StoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ContextError {
    /// Errors a user can resolve by changing input or resolving the blocking condition
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::GuardRejected { .. } | Self::PositionOutOfRange { .. }
        )
    }

    pub fn validation_kind(&self) -> Option<ValidationErrorKind> {
        match self {
            Self::Validation(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<ValidationErrorKind> for ContextError {
    fn from(kind: ValidationErrorKind) -> Self {
        ContextError::Validation(kind)
    }
}

impl From<ListPositionError> for ContextError {
    fn from(err: ListPositionError) -> Self {
        match err {
            ListPositionError::OutOfRange { requested, count } => {
                ContextError::PositionOutOfRange { requested, count }
            }
        }
    }
}

impl From<StoreError> for ContextError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Position(position_error) => position_error.into(),
            StoreError::NotFound { context_id } => ContextError::NotFound { context_id },
            other => ContextError::StoreFailure(other),
        }
    }
}

impl From<sqlx::Error> for ContextError {
    fn from(err: sqlx::Error) -> Self {
        ContextError::StoreFailure(StoreError::from(err))
    }
}

impl From<StateMachineError> for ContextError {
    fn from(err: StateMachineError) -> Self {
        match err {
            StateMachineError::InvalidTransition { from, event } => ContextError::InvalidTransition {
                from: from.to_string(),
                event: event.to_string(),
            },
            StateMachineError::GuardRejected { event, reason } => ContextError::GuardRejected {
                event: event.to_string(),
                reason,
            },
            StateMachineError::UnknownEvent { name } => ContextError::UnknownEvent(name),
            StateMachineError::GuardCheckFailed(GuardError::Lookup(store_error)) => {
                store_error.into()
            }
        }
    }
}

impl From<ConfigurationError> for ContextError {
    fn from(err: ConfigurationError) -> Self {
        ContextError::Configuration(err.to_string())
    }
}

pub type ContextResult<T> = std::result::Result<T, ContextError>;
