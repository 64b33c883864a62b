//! # Recurring Todo Model
//!
//! Recurring todo templates owned by a context. The core only creates,
//! counts and cascades them.

use super::context::{ContextId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

pub type RecurringTodoId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RecurringTodo {
    pub id: RecurringTodoId,
    pub context_id: ContextId,
    pub user_id: UserId,
    pub description: String,
}

impl RecurringTodo {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        context_id: ContextId,
        user_id: UserId,
        description: &str,
    ) -> Result<RecurringTodo, sqlx::Error> {
        sqlx::query_as::<_, RecurringTodo>(
            r#"
            INSERT INTO recurring_todos (context_id, user_id, description, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, context_id, user_id, description
            "#,
        )
        .bind(context_id)
        .bind(user_id)
        .bind(description)
        .fetch_one(executor)
        .await
    }

    pub async fn count_for_context<'e, E: PgExecutor<'e>>(
        executor: E,
        context_id: ContextId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recurring_todos WHERE context_id = $1")
            .bind(context_id)
            .fetch_one(executor)
            .await
    }

    pub async fn delete_all_for_context<'e, E: PgExecutor<'e>>(
        executor: E,
        context_id: ContextId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recurring_todos WHERE context_id = $1")
            .bind(context_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
