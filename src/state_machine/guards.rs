use super::errors::GuardResult;
use crate::models::core::context::{Context, ContextId};
use crate::store::StoreError;
use async_trait::async_trait;
use std::sync::Arc;

/// Capability for counting a context's todos that are still in the active state.
///
/// The state machine only ever needs this single count, so stores and test
/// doubles implement it without exposing the todo collection itself.
#[async_trait]
pub trait ActiveTaskCounter: Send + Sync {
    async fn count_active_tasks_for(&self, context_id: ContextId) -> Result<i64, StoreError>;
}

#[async_trait]
impl<C: ActiveTaskCounter + ?Sized> ActiveTaskCounter for Arc<C> {
    async fn count_active_tasks_for(&self, context_id: ContextId) -> Result<i64, StoreError> {
        (**self).count_active_tasks_for(context_id).await
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Reject(String),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Trait for implementing state transition guards
#[async_trait]
pub trait StateGuard<T: Sync>: Send + Sync {
    /// Check if a transition is allowed
    async fn check(&self, entity: &T) -> GuardResult<GuardDecision>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Guard on `close`: the context must not own any active todo
pub struct NoActiveTasksGuard<'a, C: ActiveTaskCounter + ?Sized> {
    counter: &'a C,
}

impl<'a, C: ActiveTaskCounter + ?Sized> NoActiveTasksGuard<'a, C> {
    pub fn new(counter: &'a C) -> Self {
        Self { counter }
    }
}

#[async_trait]
impl<C: ActiveTaskCounter + ?Sized> StateGuard<Context> for NoActiveTasksGuard<'_, C> {
    async fn check(&self, context: &Context) -> GuardResult<GuardDecision> {
        let active = self.counter.count_active_tasks_for(context.id).await?;
        if active == 0 {
            Ok(GuardDecision::Allow)
        } else {
            Ok(GuardDecision::Reject(active_tasks_reason(context.id, active)))
        }
    }

    fn description(&self) -> &'static str {
        "Context must have no active todos"
    }
}

pub(crate) fn active_tasks_reason(context_id: ContextId, active: i64) -> String {
    format!(
        "Context {} still has {} active todo{}",
        context_id,
        active,
        if active == 1 { "" } else { "s" }
    )
}
