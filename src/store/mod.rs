//! # Context Store
//!
//! The persistence collaborator for contexts. Every method is one atomic
//! unit: list-changing operations (insert, reposition, move, delete) run
//! serialized per user so readers never observe gaps or duplicate positions,
//! and `transition_state` is a compare-and-set that re-checks the close guard
//! in the same statement as the write.
//!
//! Two implementations ship with the crate:
//! - [`InMemoryContextStore`]: a `parking_lot` locked map, used in tests and embedded use
//! - [`PgContextStore`]: Postgres via `sqlx`, one transaction per operation

pub mod memory;
pub mod postgres;

pub use memory::InMemoryContextStore;
pub use postgres::PgContextStore;

use crate::models::core::context::{Context, ContextId, NewContext, UserId};
use crate::ordering::{ListMove, ListPositionError, Placement};
use crate::scopes::ContextScope;
use crate::state_machine::{ActiveTaskCounter, Transition};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Context {context_id} not found")]
    NotFound { context_id: ContextId },

    #[error("Context {context_id} changed state concurrently")]
    StaleState { context_id: ContextId },

    #[error("List position error: {0}")]
    Position(#[from] ListPositionError),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_error) = err.as_database_error() {
            if db_error.is_unique_violation() {
                return StoreError::UniqueViolation {
                    constraint: db_error.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

impl From<regex::Error> for StoreError {
    fn from(err: regex::Error) -> Self {
        StoreError::InvalidScope(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations the context core relies on
#[async_trait]
pub trait ContextStore: ActiveTaskCounter {
    /// Insert a context at `placement`, shifting the owner's list as needed.
    ///
    /// Fails with [`StoreError::UniqueViolation`] when the owner already has a
    /// context with the same name.
    async fn insert_context(
        &self,
        new_context: NewContext,
        placement: Placement,
    ) -> StoreResult<Context>;

    async fn find_by_id(&self, id: ContextId) -> StoreResult<Option<Context>>;

    async fn find_by_name(&self, user_id: UserId, name: &str) -> StoreResult<Option<Context>>;

    /// Whether the owner has another context with this name
    async fn name_taken(
        &self,
        user_id: UserId,
        name: &str,
        exclude_id: Option<ContextId>,
    ) -> StoreResult<bool>;

    /// The owner's contexts matching `scope`, in list order
    async fn list_for_user(
        &self,
        user_id: UserId,
        scope: &ContextScope,
    ) -> StoreResult<Vec<Context>>;

    async fn count_contexts_for(&self, user_id: UserId) -> StoreResult<i64>;

    /// Change a context's name; the owner is never written
    async fn rename_context(&self, id: ContextId, name: &str) -> StoreResult<Context>;

    /// Persist a transition if the context is still in `transition.from` and,
    /// when required, still has no active todos. Returns `None` when either
    /// condition no longer holds or the context is gone.
    async fn transition_state(&self, transition: &Transition) -> StoreResult<Option<Context>>;

    /// Move a context to `target` within its owner's list
    async fn reposition_context(&self, id: ContextId, target: i32) -> StoreResult<Context>;

    /// Move a context relative to its current position, resolved atomically
    async fn move_context(&self, id: ContextId, list_move: ListMove) -> StoreResult<Context>;

    /// Delete a context together with its todos and recurring todos, closing
    /// the gap in the owner's list. Returns `false` when nothing was deleted.
    async fn delete_context(&self, id: ContextId) -> StoreResult<bool>;
}

pub(crate) fn count_to_position(count: i64) -> StoreResult<i32> {
    i32::try_from(count)
        .map_err(|_| StoreError::Internal(format!("Context count {count} exceeds list capacity")))
}
