use crate::config::{ContextConfig, OrderingConfig};
use crate::constants::operations;
use crate::database;
use crate::error::{ContextError, ContextResult, ValidationErrorKind};
use crate::logging::log_context_operation;
use crate::models::core::context::{Context, ContextId, MaybeContext, NewContext, UserId};
use crate::ordering::{ListMove, Placement};
use crate::scopes::ContextScope;
use crate::state_machine::guards::active_tasks_reason;
use crate::state_machine::{ContextEvent, ContextStateMachine, Transition, TransitionTable};
use crate::store::{ContextStore, PgContextStore, StoreError};
use crate::validation::validate_context_name;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point for context operations.
///
/// Validates input, drives the state machine, and hands every write to the
/// store as a single atomic operation. Each call returns the updated record
/// or a [`ContextError`].
#[derive(Debug)]
pub struct ContextService<S> {
    store: Arc<S>,
    ordering: OrderingConfig,
}

impl<S> Clone for ContextService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ordering: self.ordering.clone(),
        }
    }
}

impl ContextService<PgContextStore> {
    /// Connect to Postgres using `config.database`
    pub async fn connect(config: &ContextConfig) -> ContextResult<Self> {
        config.validate()?;
        let pool = database::connect(&config.database).await?;
        Ok(Self::with_config(Arc::new(PgContextStore::new(pool)), config))
    }
}

impl<S: ContextStore> ContextService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            ordering: OrderingConfig::default(),
        }
    }

    pub fn with_config(store: Arc<S>, config: &ContextConfig) -> Self {
        Self {
            store,
            ordering: config.ordering.clone(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn default_placement(&self) -> Placement {
        self.ordering.default_placement
    }

    /// Create a context for `new_context.user_id`.
    ///
    /// Placement falls back to the configured default when the request does
    /// not name one. The new context starts `active`.
    pub async fn create_context(&self, new_context: NewContext) -> ContextResult<Context> {
        validate_context_name(&new_context.name)?;

        if self
            .store
            .name_taken(new_context.user_id, &new_context.name, None)
            .await?
        {
            return Err(ValidationErrorKind::NameTaken.into());
        }

        let user_id = new_context.user_id;
        let placement = new_context
            .placement
            .unwrap_or(self.ordering.default_placement);

        let context = self.store.insert_context(new_context, placement).await?;

        log_context_operation(
            operations::CREATE,
            Some(context.id),
            Some(user_id),
            "success",
            Some(&format!("position={} placement={placement}", context.position)),
        );

        Ok(context)
    }

    /// Rename a context, re-running the name checks against the owner's other contexts
    pub async fn rename_context(&self, id: ContextId, name: &str) -> ContextResult<Context> {
        validate_context_name(name)?;

        let context = self.load(id).await?;
        if self.store.name_taken(context.user_id, name, Some(id)).await? {
            return Err(ValidationErrorKind::NameTaken.into());
        }

        let renamed = self.store.rename_context(id, name).await?;

        log_context_operation(
            operations::RENAME,
            Some(id),
            Some(renamed.user_id),
            "success",
            None,
        );

        Ok(renamed)
    }

    /// Fire a lifecycle event given by name
    pub async fn fire_event_named(&self, id: ContextId, event_name: &str) -> ContextResult<Context> {
        let event: ContextEvent = event_name.parse()?;
        self.fire_event(id, event).await
    }

    /// Fire a lifecycle event against the stored context.
    ///
    /// The store persists the change only if the context is still in the
    /// state the event was validated against and, for `close`, still has no
    /// active todos. A persisted state is never left behind on failure.
    pub async fn fire_event(&self, id: ContextId, event: ContextEvent) -> ContextResult<Context> {
        let mut context = self.load(id).await?;
        let user_id = context.user_id;

        let machine = ContextStateMachine::new(self.store.as_ref());
        let transition = match machine.fire(&mut context, event).await {
            Ok(transition) => transition,
            Err(err) => {
                let err = ContextError::from(err);
                log_context_operation(
                    operations::TRANSITION,
                    Some(id),
                    Some(user_id),
                    "rejected",
                    Some(&err.to_string()),
                );
                return Err(err);
            }
        };

        match self.store.transition_state(&transition).await? {
            Some(updated) => {
                log_context_operation(
                    operations::TRANSITION,
                    Some(id),
                    Some(user_id),
                    "success",
                    Some(&format!("{}: {} -> {}", event, transition.from, transition.to)),
                );
                Ok(updated)
            }
            None => {
                let err = self.explain_lost_transition(&transition).await;
                warn!(
                    context_id = id,
                    event = %event,
                    error = %err,
                    "Transition not persisted"
                );
                Err(err)
            }
        }
    }

    pub async fn close(&self, id: ContextId) -> ContextResult<Context> {
        self.fire_event(id, ContextEvent::Close).await
    }

    pub async fn hide(&self, id: ContextId) -> ContextResult<Context> {
        self.fire_event(id, ContextEvent::Hide).await
    }

    pub async fn activate(&self, id: ContextId) -> ContextResult<Context> {
        self.fire_event(id, ContextEvent::Activate).await
    }

    /// Events the transition graph admits from the context's current state
    pub async fn permitted_events(&self, id: ContextId) -> ContextResult<Vec<ContextEvent>> {
        let context = self.load(id).await?;
        Ok(TransitionTable::permitted_events(context.state))
    }

    /// Move a context to `target` in its owner's list
    pub async fn reposition(&self, id: ContextId, target: i32) -> ContextResult<Context> {
        let context = self.store.reposition_context(id, target).await?;
        self.log_reposition(&context, &format!("target={target}"));
        Ok(context)
    }

    pub async fn move_to_top(&self, id: ContextId) -> ContextResult<Context> {
        self.apply_move(id, ListMove::ToTop).await
    }

    pub async fn move_to_bottom(&self, id: ContextId) -> ContextResult<Context> {
        self.apply_move(id, ListMove::ToBottom).await
    }

    pub async fn move_higher(&self, id: ContextId) -> ContextResult<Context> {
        self.apply_move(id, ListMove::Higher).await
    }

    pub async fn move_lower(&self, id: ContextId) -> ContextResult<Context> {
        self.apply_move(id, ListMove::Lower).await
    }

    pub async fn is_first(&self, id: ContextId) -> ContextResult<bool> {
        Ok(self.load(id).await?.is_first())
    }

    pub async fn is_last(&self, id: ContextId) -> ContextResult<bool> {
        let context = self.load(id).await?;
        let count = self.store.count_contexts_for(context.user_id).await?;
        Ok(i64::from(context.position) + 1 == count)
    }

    /// Delete a context with its todos and recurring todos
    pub async fn delete_context(&self, id: ContextId) -> ContextResult<()> {
        let context = self.load(id).await?;

        if !self.store.delete_context(id).await? {
            return Err(ContextError::NotFound { context_id: id });
        }

        log_context_operation(
            operations::DELETE,
            Some(id),
            Some(context.user_id),
            "success",
            Some(&format!("position={}", context.position)),
        );

        Ok(())
    }

    /// Look up a context, yielding [`MaybeContext::Absent`] when there is none
    pub async fn find(&self, id: ContextId) -> ContextResult<MaybeContext> {
        Ok(self.store.find_by_id(id).await?.into())
    }

    pub async fn find_by_name(&self, user_id: UserId, name: &str) -> ContextResult<MaybeContext> {
        Ok(self.store.find_by_name(user_id, name).await?.into())
    }

    /// The user's contexts matching `scope`, top of list first
    pub async fn list(&self, user_id: UserId, scope: &ContextScope) -> ContextResult<Vec<Context>> {
        Ok(self.store.list_for_user(user_id, scope).await?)
    }

    pub async fn count_for_user(&self, user_id: UserId) -> ContextResult<i64> {
        Ok(self.store.count_contexts_for(user_id).await?)
    }

    async fn load(&self, id: ContextId) -> ContextResult<Context> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ContextError::NotFound { context_id: id })
    }

    async fn apply_move(&self, id: ContextId, list_move: ListMove) -> ContextResult<Context> {
        let context = self.store.move_context(id, list_move).await?;
        self.log_reposition(&context, &format!("move={list_move:?}"));
        Ok(context)
    }

    fn log_reposition(&self, context: &Context, details: &str) {
        log_context_operation(
            operations::REPOSITION,
            Some(context.id),
            Some(context.user_id),
            "success",
            Some(&format!("{details} position={}", context.position)),
        );
    }

    /// Work out why a validated transition was not written
    async fn explain_lost_transition(&self, transition: &Transition) -> ContextError {
        let context_id = transition.context_id;

        let current = match self.store.find_by_id(context_id).await {
            Ok(Some(current)) => current,
            Ok(None) => return ContextError::NotFound { context_id },
            Err(err) => return err.into(),
        };

        if current.state != transition.from {
            debug!(
                context_id,
                expected = %transition.from,
                actual = %current.state,
                "Context state moved on before the write"
            );
            return ContextError::StoreFailure(StoreError::StaleState { context_id });
        }

        match self.store.count_active_tasks_for(context_id).await {
            Ok(active) => ContextError::GuardRejected {
                event: transition.event.to_string(),
                reason: active_tasks_reason(context_id, active),
            },
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::todo::TodoState;
    use crate::state_machine::ContextState;
    use crate::store::InMemoryContextStore;

    fn service() -> ContextService<InMemoryContextStore> {
        ContextService::new(Arc::new(InMemoryContextStore::new()))
    }

    #[tokio::test]
    async fn test_create_uses_configured_default_placement() {
        let mut config = ContextConfig::default();
        config.ordering.default_placement = Placement::Top;
        let service =
            ContextService::with_config(Arc::new(InMemoryContextStore::new()), &config);

        service.create_context(NewContext::new(1, "Home")).await.unwrap();
        let work = service.create_context(NewContext::new(1, "Work")).await.unwrap();

        assert_eq!(work.position, 0);
        assert_eq!(service.default_placement(), Placement::Top);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_names_before_store_access() {
        let service = service();

        let err = service.create_context(NewContext::new(1, "  ")).await.unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationErrorKind::NameRequired));

        let err = service
            .create_context(NewContext::new(1, "x".repeat(256)))
            .await
            .unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationErrorKind::NameTooLong));

        assert_eq!(service.count_for_user(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rename_checks_uniqueness_excluding_self() {
        let service = service();
        let home = service.create_context(NewContext::new(1, "Home")).await.unwrap();
        service.create_context(NewContext::new(1, "Work")).await.unwrap();

        let err = service.rename_context(home.id, "Work").await.unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationErrorKind::NameTaken));

        let same = service.rename_context(home.id, "Home").await.unwrap();
        assert_eq!(same.name, "Home");

        let renamed = service.rename_context(home.id, "House").await.unwrap();
        assert_eq!(renamed.name, "House");
        assert_eq!(renamed.user_id, 1);
    }

    #[tokio::test]
    async fn test_lost_guard_race_reports_guard_rejection() {
        let service = service();
        let store = Arc::clone(service.store());
        let work = service.create_context(NewContext::new(1, "Work")).await.unwrap();

        // Validated against zero active todos, then a todo lands before the write
        let transition = Transition {
            context_id: work.id,
            event: ContextEvent::Close,
            from: ContextState::Active,
            to: ContextState::Closed,
            requires_no_active_tasks: true,
        };
        store.add_todo(work.id, "call boss", TodoState::Active).unwrap();
        assert!(store.transition_state(&transition).await.unwrap().is_none());

        let err = service.explain_lost_transition(&transition).await;
        assert!(matches!(err, ContextError::GuardRejected { .. }));
    }

    #[tokio::test]
    async fn test_lost_state_race_reports_stale_state() {
        let service = service();
        let work = service.create_context(NewContext::new(1, "Work")).await.unwrap();

        let transition = Transition {
            context_id: work.id,
            event: ContextEvent::Hide,
            from: ContextState::Active,
            to: ContextState::Hidden,
            requires_no_active_tasks: false,
        };
        service.close(work.id).await.unwrap();

        let err = service.explain_lost_transition(&transition).await;
        assert!(matches!(
            err,
            ContextError::StoreFailure(StoreError::StaleState { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_context_is_not_found() {
        let service = service();

        assert!(matches!(
            service.close(42).await,
            Err(ContextError::NotFound { context_id: 42 })
        ));
        assert!(matches!(
            service.delete_context(42).await,
            Err(ContextError::NotFound { context_id: 42 })
        ));
        assert!(service.find(42).await.unwrap().is_absent());
    }

    #[tokio::test]
    async fn test_permitted_events_follow_state() {
        let service = service();
        let home = service.create_context(NewContext::new(1, "Home")).await.unwrap();

        assert_eq!(
            service.permitted_events(home.id).await.unwrap(),
            vec![ContextEvent::Close, ContextEvent::Hide]
        );

        service.hide(home.id).await.unwrap();
        assert_eq!(
            service.permitted_events(home.id).await.unwrap(),
            vec![ContextEvent::Close, ContextEvent::Activate]
        );
    }
}
