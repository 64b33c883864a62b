//! # Context Model
//!
//! A named, user-owned grouping of todos with a lifecycle state and a
//! position in the owner's context list.
//!
//! ## Database Schema
//!
//! Maps to the `contexts` table:
//! - `id`: Primary key (BIGSERIAL)
//! - `user_id`: Owning user (BIGINT), never rewritten after insert
//! - `name`: VARCHAR(255), unique per `user_id`
//! - `state`: `active | closed | hidden`
//! - `position`: dense per-user rank starting at 0, unique per `user_id` (deferrable)
//! - `created_at`, `updated_at`: TIMESTAMPTZ
//!
//! The query helpers here are generic over [`sqlx::PgExecutor`] so the
//! Postgres store can run them inside its per-user transactions.

use crate::scopes::ContextScope;
use crate::state_machine::ContextState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use crate::ordering::{Placement, Positioned};

pub type ContextId = i64;
pub type UserId = i64;

/// A persisted context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: ContextId,
    pub user_id: UserId,
    pub name: String,
    pub state: ContextState,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Context for creation (without generated fields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContext {
    pub user_id: UserId,
    pub name: String,
    /// Where to insert the context; `None` uses the configured default
    pub placement: Option<Placement>,
}

impl NewContext {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            placement: None,
        }
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }
}

impl Context {
    /// Display alias for the name
    pub fn title(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_hidden(&self) -> bool {
        self.state.is_hidden()
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Whether the context sits at the top of its owner's list
    pub fn is_first(&self) -> bool {
        self.position == crate::constants::TOP_OF_LIST
    }

    /// Whether the context sits at the bottom of a list holding `count` entries
    pub fn is_last(&self, count: i32) -> bool {
        self.position == count - 1
    }
}

impl Positioned for Context {
    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }
}

/// Row shape of the `contexts` table; `state` is stored as text
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ContextRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub state: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ContextRow> for Context {
    type Error = sqlx::Error;

    fn try_from(row: ContextRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse::<ContextState>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Context {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            state,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const CONTEXT_COLUMNS: &str = "id, user_id, name, state, position, created_at, updated_at";

impl Context {
    /// Find a context by ID
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: ContextId,
    ) -> Result<Option<Context>, sqlx::Error> {
        let row = sqlx::query_as::<_, ContextRow>(&format!(
            "SELECT {CONTEXT_COLUMNS} FROM contexts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        row.map(Context::try_from).transpose()
    }

    /// Find a user's context by exact name
    pub async fn find_by_name<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<Context>, sqlx::Error> {
        let row = sqlx::query_as::<_, ContextRow>(&format!(
            "SELECT {CONTEXT_COLUMNS} FROM contexts WHERE user_id = $1 AND name = $2"
        ))
        .bind(user_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;

        row.map(Context::try_from).transpose()
    }

    /// List a user's contexts in list order, filtered by scope
    pub async fn list_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: UserId,
        scope: &ContextScope,
    ) -> Result<Vec<Context>, sqlx::Error> {
        let state = scope.state().map(|s| s.as_str());
        let pattern = scope.name_pattern();

        let rows = sqlx::query_as::<_, ContextRow>(&format!(
            r#"
            SELECT {CONTEXT_COLUMNS}
            FROM contexts
            WHERE user_id = $1
              AND ($2::text IS NULL OR state = $2)
              AND ($3::text IS NULL OR name ILIKE $3)
            ORDER BY position ASC
            "#
        ))
        .bind(user_id)
        .bind(state)
        .bind(pattern)
        .fetch_all(executor)
        .await?;

        rows.into_iter().map(Context::try_from).collect()
    }

    /// Count a user's contexts
    pub async fn count_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: UserId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contexts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await
    }

    /// Check if a name is free for a user (for validation)
    pub async fn is_name_unique<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: UserId,
        name: &str,
        exclude_id: Option<ContextId>,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM contexts
            WHERE user_id = $1 AND name = $2 AND ($3::bigint IS NULL OR id != $3)
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(executor)
        .await?;

        Ok(count == 0)
    }
}

#[cfg(test)]
impl Context {
    pub(crate) fn for_test(id: ContextId, user_id: UserId, name: &str, position: i32) -> Self {
        let now = Utc::now();
        Context {
            id,
            user_id,
            name: name.to_string(),
            state: ContextState::Active,
            position,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Either a real context or the explicit absence of one.
///
/// Call sites that may or may not have a context (a todo with no context, a
/// lookup that found nothing) match on this instead of threading `Option`
/// through display code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "context", rename_all = "snake_case")]
pub enum MaybeContext {
    Present(Context),
    Absent,
}

impl MaybeContext {
    /// Name of the context, or an empty string when absent
    pub fn name(&self) -> &str {
        match self {
            Self::Present(context) => &context.name,
            Self::Absent => "",
        }
    }

    pub fn title(&self) -> &str {
        self.name()
    }

    pub fn id(&self) -> Option<ContextId> {
        match self {
            Self::Present(context) => Some(context.id),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Self::Present(context) => Some(context),
            Self::Absent => None,
        }
    }

    pub fn into_context(self) -> Option<Context> {
        match self {
            Self::Present(context) => Some(context),
            Self::Absent => None,
        }
    }
}

impl Default for MaybeContext {
    fn default() -> Self {
        Self::Absent
    }
}

impl From<Option<Context>> for MaybeContext {
    fn from(context: Option<Context>) -> Self {
        match context {
            Some(context) => Self::Present(context),
            None => Self::Absent,
        }
    }
}

impl From<Context> for MaybeContext {
    fn from(context: Context) -> Self {
        Self::Present(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_aliases_name() {
        let context = Context::for_test(1, 1, "Errands", 2);
        assert_eq!(context.title(), "Errands");
    }

    #[test]
    fn test_first_and_last() {
        let top = Context::for_test(1, 1, "Home", 0);
        let bottom = Context::for_test(2, 1, "Work", 2);

        assert!(top.is_first());
        assert!(!top.is_last(3));
        assert!(bottom.is_last(3));
        assert!(!bottom.is_first());
    }

    #[test]
    fn test_absent_context_behaves_as_null_object() {
        let absent = MaybeContext::Absent;
        assert_eq!(absent.name(), "");
        assert_eq!(absent.title(), "");
        assert_eq!(absent.id(), None);
        assert!(absent.is_absent());
        assert!(absent.as_context().is_none());
    }

    #[test]
    fn test_present_context() {
        let present: MaybeContext = Some(Context::for_test(5, 1, "Home", 0)).into();
        assert_eq!(present.name(), "Home");
        assert_eq!(present.id(), Some(5));
        assert!(!present.is_absent());
    }

    #[test]
    fn test_row_with_unknown_state_fails_to_decode() {
        let now = Utc::now();
        let row = ContextRow {
            id: 1,
            user_id: 1,
            name: "Home".to_string(),
            state: "archived".to_string(),
            position: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(Context::try_from(row).is_err());
    }

    #[test]
    fn test_new_context_placement_builder() {
        let new_context = NewContext::new(3, "Garden").at(Placement::Top);
        assert_eq!(new_context.placement, Some(Placement::Top));
        assert_eq!(NewContext::new(3, "Garden").placement, None);
    }
}
