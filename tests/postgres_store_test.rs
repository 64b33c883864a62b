//! Postgres store integration tests.
//!
//! Run with `cargo test --features test-db` against `DATABASE_URL`; each test
//! gets a fresh migrated database.
#![cfg(feature = "test-db")]

use context_core::models::core::recurring_todo::RecurringTodo;
use context_core::models::{NewContext, Todo, TodoState};
use context_core::ordering::{is_dense, Placement};
use context_core::services::ContextService;
use context_core::state_machine::ContextState;
use context_core::store::{ContextStore, PgContextStore};
use context_core::{ContextError, ContextScope, StoreError, ValidationErrorKind};
use sqlx::PgPool;
use std::sync::Arc;

fn service(pool: &PgPool) -> ContextService<PgContextStore> {
    ContextService::new(Arc::new(PgContextStore::new(pool.clone())))
}

async fn layout(service: &ContextService<PgContextStore>, user_id: i64) -> Vec<(String, i32)> {
    service
        .list(user_id, &ContextScope::new())
        .await
        .unwrap()
        .into_iter()
        .map(|context| (context.name, context.position))
        .collect()
}

fn expected(entries: &[(&str, i32)]) -> Vec<(String, i32)> {
    entries
        .iter()
        .map(|(name, position)| (name.to_string(), *position))
        .collect()
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_reposition_and_delete_keep_positions_dense(pool: PgPool) {
    let service = service(&pool);
    let mut ids = Vec::new();
    for name in ["Home", "Work", "Errands"] {
        ids.push(
            service
                .create_context(NewContext::new(1, name))
                .await
                .unwrap()
                .id,
        );
    }

    service.reposition(ids[2], 0).await.unwrap();
    assert_eq!(
        layout(&service, 1).await,
        expected(&[("Errands", 0), ("Home", 1), ("Work", 2)])
    );

    service.delete_context(ids[0]).await.unwrap();
    assert_eq!(
        layout(&service, 1).await,
        expected(&[("Errands", 0), ("Work", 1)])
    );
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_insert_at_top_shifts_inside_one_transaction(pool: PgPool) {
    let service = service(&pool);
    service.create_context(NewContext::new(1, "Home")).await.unwrap();
    service.create_context(NewContext::new(1, "Work")).await.unwrap();

    let top = service
        .create_context(NewContext::new(1, "Errands").at(Placement::Top))
        .await
        .unwrap();

    assert_eq!(top.position, 0);
    assert_eq!(
        layout(&service, 1).await,
        expected(&[("Errands", 0), ("Home", 1), ("Work", 2)])
    );
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_name_uniqueness_is_per_user(pool: PgPool) {
    let service = service(&pool);
    service.create_context(NewContext::new(1, "Home")).await.unwrap();

    let err = service
        .create_context(NewContext::new(1, "Home"))
        .await
        .unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationErrorKind::NameTaken));

    service.create_context(NewContext::new(2, "Home")).await.unwrap();
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_store_insert_reports_unique_violation(pool: PgPool) {
    let store = PgContextStore::new(pool.clone());
    store
        .insert_context(NewContext::new(1, "Home"), Placement::Bottom)
        .await
        .unwrap();

    let err = store
        .insert_context(NewContext::new(1, "Home"), Placement::Bottom)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { .. }));
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_close_is_guarded_by_active_todos(pool: PgPool) {
    let service = service(&pool);
    let work = service.create_context(NewContext::new(1, "Work")).await.unwrap();
    let todo = Todo::create(&pool, work.id, 1, "ship report", TodoState::Active)
        .await
        .unwrap();

    let err = service.close(work.id).await.unwrap_err();
    assert!(matches!(err, ContextError::GuardRejected { .. }));
    assert!(service
        .find(work.id)
        .await
        .unwrap()
        .as_context()
        .unwrap()
        .is_active());

    Todo::update_state(&pool, todo.id, TodoState::Completed)
        .await
        .unwrap();
    let closed = service.close(work.id).await.unwrap();
    assert_eq!(closed.state, ContextState::Closed);
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_transition_write_rechecks_the_guard(pool: PgPool) {
    use context_core::state_machine::{ContextEvent, Transition};

    let store = PgContextStore::new(pool.clone());
    let work = store
        .insert_context(NewContext::new(1, "Work"), Placement::Bottom)
        .await
        .unwrap();
    Todo::create(&pool, work.id, 1, "late arrival", TodoState::Active)
        .await
        .unwrap();

    let transition = Transition {
        context_id: work.id,
        event: ContextEvent::Close,
        from: ContextState::Active,
        to: ContextState::Closed,
        requires_no_active_tasks: true,
    };
    assert!(store.transition_state(&transition).await.unwrap().is_none());

    let stale = Transition {
        from: ContextState::Hidden,
        requires_no_active_tasks: false,
        ..transition
    };
    assert!(store.transition_state(&stale).await.unwrap().is_none());
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_delete_cascades_to_todos(pool: PgPool) {
    let service = service(&pool);
    let work = service.create_context(NewContext::new(1, "Work")).await.unwrap();
    Todo::create(&pool, work.id, 1, "report", TodoState::Active)
        .await
        .unwrap();
    RecurringTodo::create(&pool, work.id, 1, "weekly sync")
        .await
        .unwrap();

    service.delete_context(work.id).await.unwrap();

    assert_eq!(Todo::count_for_context(&pool, work.id).await.unwrap(), 0);
    assert_eq!(
        RecurringTodo::count_for_context(&pool, work.id).await.unwrap(),
        0
    );
    assert!(service.find(work.id).await.unwrap().is_absent());
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_scopes_filter_in_sql(pool: PgPool) {
    let service = service(&pool);
    let home = service.create_context(NewContext::new(1, "Home")).await.unwrap();
    service.create_context(NewContext::new(1, "Homework")).await.unwrap();
    service.hide(home.id).await.unwrap();

    let hidden = service
        .list(1, &ContextScope::new().hidden())
        .await
        .unwrap();
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0].name, "Home");

    let named = service
        .list(1, &ContextScope::new().with_name("HOME%"))
        .await
        .unwrap();
    assert_eq!(named.len(), 2);
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_concurrent_inserts_serialize_per_user(pool: PgPool) {
    let service = service(&pool);

    let handles: Vec<_> = (0..16)
        .map(|index| {
            let service = service.clone();
            tokio::spawn(async move {
                let placement = if index % 2 == 0 {
                    Placement::Top
                } else {
                    Placement::Bottom
                };
                service
                    .create_context(NewContext::new(1, format!("Context {index}")).at(placement))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let positions: Vec<i32> = layout(&service, 1)
        .await
        .into_iter()
        .map(|(_, position)| position)
        .collect();
    assert_eq!(positions.len(), 16);
    assert!(is_dense(positions));
}

#[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
async fn test_migrations_are_idempotent(pool: PgPool) {
    context_core::database::migrator::run_migrations(&pool)
        .await
        .unwrap();

    let store = PgContextStore::new(pool.clone());
    assert_eq!(store.count_contexts_for(1).await.unwrap(), 0);
}

#[tokio::test]
async fn test_connection_health_check() {
    use context_core::database::DatabaseConnection;
    use context_core::DatabaseConfig;

    let config = DatabaseConfig {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for test-db"),
        ..DatabaseConfig::default()
    };

    let connection = DatabaseConnection::new(&config).await.unwrap();
    assert!(connection.health_check().await.unwrap());
    connection.close().await;
}
