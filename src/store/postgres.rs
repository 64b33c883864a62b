//! Postgres-backed context store.
//!
//! Each list-changing operation runs in one transaction that first takes a
//! transaction-scoped advisory lock on the owning user, so operations for the
//! same user serialize while different users never contend. Position
//! uniqueness is a deferrable constraint, checked at commit once the whole
//! shift has been applied.

use super::{count_to_position, ContextStore, StoreError, StoreResult};
use crate::constants::constraints;
use crate::models::core::context::{Context, ContextId, ContextRow, NewContext, UserId};
use crate::models::core::recurring_todo::RecurringTodo;
use crate::models::core::todo::Todo;
use crate::ordering::{plan_insert, plan_move, plan_remove, plan_reposition};
use crate::ordering::{ListChange, ListMove, Placement, ShiftRange};
use crate::scopes::ContextScope;
use crate::state_machine::{ActiveTaskCounter, ContextState, Transition};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PgContextStore {
    pool: PgPool,
}

impl PgContextStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Serialize list operations for one user until the transaction ends
    async fn lock_user(tx: &mut Transaction<'_, Postgres>, user_id: UserId) -> StoreResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Load a context and lock its owner's list.
    ///
    /// The owner never changes, so the first read is only used to find the
    /// lock key; the record is read again once the lock is held.
    async fn load_locked(
        tx: &mut Transaction<'_, Postgres>,
        id: ContextId,
    ) -> StoreResult<Context> {
        let user_id = Context::find_by_id(&mut **tx, id)
            .await?
            .ok_or(StoreError::NotFound { context_id: id })?
            .user_id;

        Self::lock_user(tx, user_id).await?;

        Context::find_by_id(&mut **tx, id)
            .await?
            .ok_or(StoreError::NotFound { context_id: id })
    }

    async fn shift_positions(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        shift: &ShiftRange,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE contexts
            SET position = position + $2, updated_at = NOW()
            WHERE user_id = $1
              AND position >= $3
              AND ($4::integer IS NULL OR position <= $4)
            "#,
        )
        .bind(user_id)
        .bind(shift.delta)
        .bind(shift.from)
        .bind(shift.to)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn apply_change(
        tx: &mut Transaction<'_, Postgres>,
        context: Context,
        change: ListChange,
    ) -> StoreResult<Context> {
        if change.is_noop_for(context.position) {
            return Ok(context);
        }

        if let Some(shift) = change.shift {
            Self::shift_positions(tx, context.user_id, &shift).await?;
        }

        let row = sqlx::query_as::<_, ContextRow>(
            r#"
            UPDATE contexts
            SET position = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, name, state, position, created_at, updated_at
            "#,
        )
        .bind(context.id)
        .bind(change.position)
        .fetch_one(&mut **tx)
        .await?;

        Ok(Context::try_from(row)?)
    }
}

#[async_trait]
impl ActiveTaskCounter for PgContextStore {
    async fn count_active_tasks_for(&self, context_id: ContextId) -> Result<i64, StoreError> {
        Ok(Todo::count_active_for_context(&self.pool, context_id).await?)
    }
}

#[async_trait]
impl ContextStore for PgContextStore {
    async fn insert_context(
        &self,
        new_context: NewContext,
        placement: Placement,
    ) -> StoreResult<Context> {
        let mut tx = self.pool.begin().await?;
        Self::lock_user(&mut tx, new_context.user_id).await?;

        if !Context::is_name_unique(&mut *tx, new_context.user_id, &new_context.name, None).await? {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::UNIQUE_NAME_PER_USER.to_string(),
            });
        }

        let count = count_to_position(Context::count_for_user(&mut *tx, new_context.user_id).await?)?;
        let change = plan_insert(count, placement);

        if let Some(shift) = change.shift {
            Self::shift_positions(&mut tx, new_context.user_id, &shift).await?;
        }

        let row = sqlx::query_as::<_, ContextRow>(
            r#"
            INSERT INTO contexts (user_id, name, state, position, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, user_id, name, state, position, created_at, updated_at
            "#,
        )
        .bind(new_context.user_id)
        .bind(&new_context.name)
        .bind(ContextState::default().as_str())
        .bind(change.position)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let context = Context::try_from(row)?;
        debug!(
            context_id = context.id,
            user_id = context.user_id,
            position = context.position,
            "Inserted context"
        );
        Ok(context)
    }

    async fn find_by_id(&self, id: ContextId) -> StoreResult<Option<Context>> {
        Ok(Context::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_name(&self, user_id: UserId, name: &str) -> StoreResult<Option<Context>> {
        Ok(Context::find_by_name(&self.pool, user_id, name).await?)
    }

    async fn name_taken(
        &self,
        user_id: UserId,
        name: &str,
        exclude_id: Option<ContextId>,
    ) -> StoreResult<bool> {
        Ok(!Context::is_name_unique(&self.pool, user_id, name, exclude_id).await?)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        scope: &ContextScope,
    ) -> StoreResult<Vec<Context>> {
        Ok(Context::list_for_user(&self.pool, user_id, scope).await?)
    }

    async fn count_contexts_for(&self, user_id: UserId) -> StoreResult<i64> {
        Ok(Context::count_for_user(&self.pool, user_id).await?)
    }

    async fn rename_context(&self, id: ContextId, name: &str) -> StoreResult<Context> {
        let row = sqlx::query_as::<_, ContextRow>(
            r#"
            UPDATE contexts
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, name, state, position, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { context_id: id })?;

        Ok(Context::try_from(row)?)
    }

    async fn transition_state(&self, transition: &Transition) -> StoreResult<Option<Context>> {
        let row = sqlx::query_as::<_, ContextRow>(
            r#"
            UPDATE contexts
            SET state = $3, updated_at = NOW()
            WHERE id = $1
              AND state = $2
              AND (
                NOT $4
                OR NOT EXISTS (
                  SELECT 1 FROM todos
                  WHERE todos.context_id = contexts.id AND todos.state = 'active'
                )
              )
            RETURNING id, user_id, name, state, position, created_at, updated_at
            "#,
        )
        .bind(transition.context_id)
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .bind(transition.requires_no_active_tasks)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Context::try_from).transpose()?)
    }

    async fn reposition_context(&self, id: ContextId, target: i32) -> StoreResult<Context> {
        let mut tx = self.pool.begin().await?;
        let context = Self::load_locked(&mut tx, id).await?;

        let count = count_to_position(Context::count_for_user(&mut *tx, context.user_id).await?)?;
        let change = plan_reposition(context.position, target, count)?;

        let updated = Self::apply_change(&mut tx, context, change).await?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn move_context(&self, id: ContextId, list_move: ListMove) -> StoreResult<Context> {
        let mut tx = self.pool.begin().await?;
        let context = Self::load_locked(&mut tx, id).await?;

        let count = count_to_position(Context::count_for_user(&mut *tx, context.user_id).await?)?;
        let change = plan_move(list_move, context.position, count)?;

        let updated = Self::apply_change(&mut tx, context, change).await?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_context(&self, id: ContextId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let context = match Self::load_locked(&mut tx, id).await {
            Ok(context) => context,
            Err(StoreError::NotFound { .. }) => return Ok(false),
            Err(other) => return Err(other),
        };

        let todos = Todo::delete_all_for_context(&mut *tx, id).await?;
        let recurring = RecurringTodo::delete_all_for_context(&mut *tx, id).await?;

        sqlx::query("DELETE FROM contexts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        Self::shift_positions(&mut tx, context.user_id, &plan_remove(context.position)).await?;
        tx.commit().await?;

        debug!(
            context_id = id,
            user_id = context.user_id,
            todos_deleted = todos,
            recurring_todos_deleted = recurring,
            "Deleted context"
        );

        Ok(true)
    }
}
