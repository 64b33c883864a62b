use super::{count_to_position, ContextStore, StoreError, StoreResult};
use crate::constants::constraints;
use crate::models::core::context::{Context, ContextId, NewContext, UserId};
use crate::models::core::recurring_todo::{RecurringTodo, RecurringTodoId};
use crate::models::core::todo::{Todo, TodoId, TodoState};
use crate::ordering::{apply_shift, plan_insert, plan_move, plan_remove, plan_reposition};
use crate::ordering::{ListChange, ListMove, Placement};
use crate::scopes::ContextScope;
use crate::state_machine::{ActiveTaskCounter, ContextState, Transition};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
struct StoreState {
    next_context_id: ContextId,
    next_todo_id: TodoId,
    next_recurring_todo_id: RecurringTodoId,
    contexts: BTreeMap<ContextId, Context>,
    todos: BTreeMap<TodoId, Todo>,
    recurring_todos: BTreeMap<RecurringTodoId, RecurringTodo>,
}

impl StoreState {
    fn user_contexts_mut(&mut self, user_id: UserId) -> impl Iterator<Item = &mut Context> {
        self.contexts
            .values_mut()
            .filter(move |context| context.user_id == user_id)
    }

    fn count_for_user(&self, user_id: UserId) -> i64 {
        self.contexts
            .values()
            .filter(|context| context.user_id == user_id)
            .count() as i64
    }

    fn name_taken(&self, user_id: UserId, name: &str, exclude_id: Option<ContextId>) -> bool {
        self.contexts.values().any(|context| {
            context.user_id == user_id && context.name == name && Some(context.id) != exclude_id
        })
    }

    fn active_todos_for(&self, context_id: ContextId) -> i64 {
        self.todos
            .values()
            .filter(|todo| {
                todo.context_id == context_id
                    && todo.todo_state().is_some_and(|state| state.is_active())
            })
            .count() as i64
    }

    fn context(&self, id: ContextId) -> StoreResult<&Context> {
        self.contexts
            .get(&id)
            .ok_or(StoreError::NotFound { context_id: id })
    }

    /// Apply a planned move for `id` within its owner's list
    fn apply_change(&mut self, id: ContextId, change: ListChange) -> StoreResult<Context> {
        let user_id = self.context(id)?.user_id;
        let now = Utc::now();

        if let Some(shift) = change.shift {
            let shifted = self
                .user_contexts_mut(user_id)
                .filter(|context| context.id != id && shift.contains(context.position));
            for context in shifted {
                context.updated_at = now;
                apply_shift(std::iter::once(context), &shift);
            }
        }

        let context = self
            .contexts
            .get_mut(&id)
            .ok_or(StoreError::NotFound { context_id: id })?;
        if context.position != change.position {
            context.position = change.position;
            context.updated_at = now;
        }

        Ok(context.clone())
    }
}

/// In-memory context store.
///
/// All operations take the single write lock, so every operation is atomic
/// with respect to every reader. Also models the todo and recurring todo
/// tables that guards count and deletes cascade into.
#[derive(Debug, Default)]
pub struct InMemoryContextStore {
    state: RwLock<StoreState>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a todo to an existing context
    pub fn add_todo(
        &self,
        context_id: ContextId,
        description: &str,
        state: TodoState,
    ) -> StoreResult<Todo> {
        let mut guard = self.state.write();
        let user_id = guard.context(context_id)?.user_id;

        guard.next_todo_id += 1;
        let todo = Todo {
            id: guard.next_todo_id,
            context_id,
            user_id,
            description: description.to_string(),
            state: state.as_str().to_string(),
        };
        guard.todos.insert(todo.id, todo.clone());

        Ok(todo)
    }

    /// Move a todo to another state; `false` when the todo does not exist
    pub fn set_todo_state(&self, todo_id: TodoId, state: TodoState) -> bool {
        let mut guard = self.state.write();
        match guard.todos.get_mut(&todo_id) {
            Some(todo) => {
                todo.state = state.as_str().to_string();
                true
            }
            None => false,
        }
    }

    /// Add a recurring todo to an existing context
    pub fn add_recurring_todo(
        &self,
        context_id: ContextId,
        description: &str,
    ) -> StoreResult<RecurringTodo> {
        let mut guard = self.state.write();
        let user_id = guard.context(context_id)?.user_id;

        guard.next_recurring_todo_id += 1;
        let recurring = RecurringTodo {
            id: guard.next_recurring_todo_id,
            context_id,
            user_id,
            description: description.to_string(),
        };
        guard.recurring_todos.insert(recurring.id, recurring.clone());

        Ok(recurring)
    }

    pub fn count_todos_for(&self, context_id: ContextId) -> usize {
        self.state
            .read()
            .todos
            .values()
            .filter(|todo| todo.context_id == context_id)
            .count()
    }

    pub fn count_recurring_todos_for(&self, context_id: ContextId) -> usize {
        self.state
            .read()
            .recurring_todos
            .values()
            .filter(|recurring| recurring.context_id == context_id)
            .count()
    }
}

#[async_trait]
impl ActiveTaskCounter for InMemoryContextStore {
    async fn count_active_tasks_for(&self, context_id: ContextId) -> Result<i64, StoreError> {
        Ok(self.state.read().active_todos_for(context_id))
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn insert_context(
        &self,
        new_context: NewContext,
        placement: Placement,
    ) -> StoreResult<Context> {
        let mut guard = self.state.write();

        if guard.name_taken(new_context.user_id, &new_context.name, None) {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::UNIQUE_NAME_PER_USER.to_string(),
            });
        }

        let count = count_to_position(guard.count_for_user(new_context.user_id))?;
        let change = plan_insert(count, placement);
        let now = Utc::now();

        if let Some(shift) = change.shift {
            for context in guard.user_contexts_mut(new_context.user_id) {
                context.updated_at = now;
                apply_shift(std::iter::once(context), &shift);
            }
        }

        guard.next_context_id += 1;
        let context = Context {
            id: guard.next_context_id,
            user_id: new_context.user_id,
            name: new_context.name,
            state: ContextState::default(),
            position: change.position,
            created_at: now,
            updated_at: now,
        };
        guard.contexts.insert(context.id, context.clone());

        debug!(
            context_id = context.id,
            user_id = context.user_id,
            position = context.position,
            "Inserted context"
        );

        Ok(context)
    }

    async fn find_by_id(&self, id: ContextId) -> StoreResult<Option<Context>> {
        Ok(self.state.read().contexts.get(&id).cloned())
    }

    async fn find_by_name(&self, user_id: UserId, name: &str) -> StoreResult<Option<Context>> {
        Ok(self
            .state
            .read()
            .contexts
            .values()
            .find(|context| context.user_id == user_id && context.name == name)
            .cloned())
    }

    async fn name_taken(
        &self,
        user_id: UserId,
        name: &str,
        exclude_id: Option<ContextId>,
    ) -> StoreResult<bool> {
        Ok(self.state.read().name_taken(user_id, name, exclude_id))
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        scope: &ContextScope,
    ) -> StoreResult<Vec<Context>> {
        let matcher = scope.matcher()?;
        let guard = self.state.read();

        let mut contexts: Vec<Context> = guard
            .contexts
            .values()
            .filter(|context| context.user_id == user_id && matcher.matches(context))
            .cloned()
            .collect();
        contexts.sort_by_key(|context| context.position);

        Ok(contexts)
    }

    async fn count_contexts_for(&self, user_id: UserId) -> StoreResult<i64> {
        Ok(self.state.read().count_for_user(user_id))
    }

    async fn rename_context(&self, id: ContextId, name: &str) -> StoreResult<Context> {
        let mut guard = self.state.write();
        let user_id = guard.context(id)?.user_id;

        if guard.name_taken(user_id, name, Some(id)) {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::UNIQUE_NAME_PER_USER.to_string(),
            });
        }

        let context = guard
            .contexts
            .get_mut(&id)
            .ok_or(StoreError::NotFound { context_id: id })?;
        context.name = name.to_string();
        context.updated_at = Utc::now();

        Ok(context.clone())
    }

    async fn transition_state(&self, transition: &Transition) -> StoreResult<Option<Context>> {
        let mut guard = self.state.write();

        let blocked = transition.requires_no_active_tasks
            && guard.active_todos_for(transition.context_id) > 0;

        match guard.contexts.get_mut(&transition.context_id) {
            Some(context) if context.state == transition.from && !blocked => {
                context.state = transition.to;
                context.updated_at = Utc::now();
                Ok(Some(context.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn reposition_context(&self, id: ContextId, target: i32) -> StoreResult<Context> {
        let mut guard = self.state.write();
        let context = guard.context(id)?;
        let count = count_to_position(guard.count_for_user(context.user_id))?;

        let change = plan_reposition(context.position, target, count)?;
        guard.apply_change(id, change)
    }

    async fn move_context(&self, id: ContextId, list_move: ListMove) -> StoreResult<Context> {
        let mut guard = self.state.write();
        let context = guard.context(id)?;
        let count = count_to_position(guard.count_for_user(context.user_id))?;

        let change = plan_move(list_move, context.position, count)?;
        guard.apply_change(id, change)
    }

    async fn delete_context(&self, id: ContextId) -> StoreResult<bool> {
        let mut guard = self.state.write();

        let Some(removed) = guard.contexts.remove(&id) else {
            return Ok(false);
        };

        guard.todos.retain(|_, todo| todo.context_id != id);
        guard
            .recurring_todos
            .retain(|_, recurring| recurring.context_id != id);

        let shift = plan_remove(removed.position);
        let now = Utc::now();
        for context in guard
            .user_contexts_mut(removed.user_id)
            .filter(|context| shift.contains(context.position))
        {
            context.updated_at = now;
            apply_shift(std::iter::once(context), &shift);
        }

        debug!(
            context_id = id,
            user_id = removed.user_id,
            "Deleted context with its todos and recurring todos"
        );

        Ok(true)
    }
}
