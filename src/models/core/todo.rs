//! # Todo Model
//!
//! Minimal view of the todos a context owns. The context core only cares
//! whether a todo is in the `active` state; everything else about todos
//! belongs to the wider application.

use super::context::{ContextId, UserId};
use crate::constants::todo_states;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;

pub type TodoId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoState {
    Active,
    Completed,
    Deferred,
    Pending,
}

impl TodoState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => todo_states::ACTIVE,
            Self::Completed => todo_states::COMPLETED,
            Self::Deferred => todo_states::DEFERRED,
            Self::Pending => todo_states::PENDING,
        }
    }
}

impl fmt::Display for TodoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TodoState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            todo_states::ACTIVE => Ok(Self::Active),
            todo_states::COMPLETED => Ok(Self::Completed),
            todo_states::DEFERRED => Ok(Self::Deferred),
            todo_states::PENDING => Ok(Self::Pending),
            _ => Err(format!("Invalid todo state: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: TodoId,
    pub context_id: ContextId,
    pub user_id: UserId,
    pub description: String,
    pub state: String,
}

impl Todo {
    pub fn todo_state(&self) -> Option<TodoState> {
        self.state.parse().ok()
    }

    /// Create a todo under a context
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        context_id: ContextId,
        user_id: UserId,
        description: &str,
        state: TodoState,
    ) -> Result<Todo, sqlx::Error> {
        sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (context_id, user_id, description, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, context_id, user_id, description, state
            "#,
        )
        .bind(context_id)
        .bind(user_id)
        .bind(description)
        .bind(state.as_str())
        .fetch_one(executor)
        .await
    }

    /// Move a todo to another state
    pub async fn update_state<'e, E: PgExecutor<'e>>(
        executor: E,
        id: TodoId,
        state: TodoState,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE todos SET state = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(state.as_str())
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count a context's todos in the active state
    pub async fn count_active_for_context<'e, E: PgExecutor<'e>>(
        executor: E,
        context_id: ContextId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM todos WHERE context_id = $1 AND state = $2",
        )
        .bind(context_id)
        .bind(todo_states::ACTIVE)
        .fetch_one(executor)
        .await
    }

    /// Count all of a context's todos
    pub async fn count_for_context<'e, E: PgExecutor<'e>>(
        executor: E,
        context_id: ContextId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todos WHERE context_id = $1")
            .bind(context_id)
            .fetch_one(executor)
            .await
    }

    /// Delete every todo owned by a context
    pub async fn delete_all_for_context<'e, E: PgExecutor<'e>>(
        executor: E,
        context_id: ContextId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE context_id = $1")
            .bind(context_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
