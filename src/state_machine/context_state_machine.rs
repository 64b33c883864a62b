use super::{
    errors::{guard_rejected, StateMachineError, StateMachineResult},
    events::ContextEvent,
    guards::{ActiveTaskCounter, GuardDecision, NoActiveTasksGuard, StateGuard},
    states::ContextState,
};
use crate::models::core::context::{Context, ContextId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The context lifecycle graph.
///
/// | event    | from             | to     | guard             |
/// |----------|------------------|--------|-------------------|
/// | close    | active, hidden   | closed | no active todos   |
/// | hide     | active, closed   | hidden |                   |
/// | activate | closed, hidden   | active |                   |
///
/// Self-transitions are not part of the graph and are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionTable;

impl TransitionTable {
    /// Resolve the target state for `event` fired from `current`
    pub fn target_state(current: ContextState, event: ContextEvent) -> StateMachineResult<ContextState> {
        use ContextEvent::*;
        use ContextState::*;

        let target = match (current, event) {
            (Active | Hidden, Close) => Closed,
            (Active | Closed, Hide) => Hidden,
            (Closed | Hidden, Activate) => Active,
            (from, event) => return Err(StateMachineError::InvalidTransition { from, event }),
        };

        Ok(target)
    }

    /// Whether the graph admits `event` from `state`; the guard is not evaluated
    pub fn can_fire(state: ContextState, event: ContextEvent) -> bool {
        Self::target_state(state, event).is_ok()
    }

    /// Events the graph admits from `state`
    pub fn permitted_events(state: ContextState) -> Vec<ContextEvent> {
        ContextEvent::ALL
            .into_iter()
            .filter(|event| Self::can_fire(state, *event))
            .collect()
    }
}

/// A transition that has been applied in memory and is ready to persist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub context_id: ContextId,
    pub event: ContextEvent,
    pub from: ContextState,
    pub to: ContextState,
    /// Persistence must re-check that no active todos exist
    pub requires_no_active_tasks: bool,
}

/// Context state machine.
///
/// Validates an event against the [`TransitionTable`], evaluates the close
/// guard through the injected [`ActiveTaskCounter`], and updates the record in
/// memory. Persisting the returned [`Transition`] is left to the caller.
pub struct ContextStateMachine<'a, C: ActiveTaskCounter + ?Sized> {
    counter: &'a C,
}

impl<'a, C: ActiveTaskCounter + ?Sized> ContextStateMachine<'a, C> {
    pub fn new(counter: &'a C) -> Self {
        Self { counter }
    }

    /// Fire an event by name, rejecting names outside the event table
    pub async fn fire_named(
        &self,
        context: &mut Context,
        event_name: &str,
    ) -> StateMachineResult<Transition> {
        let event: ContextEvent = event_name.parse()?;
        self.fire(context, event).await
    }

    /// Fire `event` against `context`.
    ///
    /// On success the context's state is set to the target state. On any error
    /// the context is left untouched.
    pub async fn fire(
        &self,
        context: &mut Context,
        event: ContextEvent,
    ) -> StateMachineResult<Transition> {
        let from = context.state;
        let to = TransitionTable::target_state(from, event)?;

        if event.is_guarded() {
            let guard = NoActiveTasksGuard::new(self.counter);
            if let GuardDecision::Reject(reason) = guard.check(context).await? {
                debug!(
                    context_id = context.id,
                    event = %event,
                    guard = guard.description(),
                    "Transition rejected by guard"
                );
                return Err(guard_rejected(event, reason));
            }
        }

        context.state = to;

        debug!(
            context_id = context.id,
            event = %event,
            from = %from,
            to = %to,
            "Transition applied in memory"
        );

        Ok(Transition {
            context_id: context.id,
            event,
            from,
            to,
            requires_no_active_tasks: event.is_guarded(),
        })
    }
}
