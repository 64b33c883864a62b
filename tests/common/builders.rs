//! Shared fixtures for the in-memory integration suites

use context_core::models::{Context, NewContext, UserId};
use context_core::services::ContextService;
use context_core::store::InMemoryContextStore;
use context_core::ContextScope;
use std::sync::Arc;

pub type MemoryService = ContextService<InMemoryContextStore>;

/// A service over a fresh in-memory store, plus a handle for seeding todos
pub fn in_memory_service() -> (MemoryService, Arc<InMemoryContextStore>) {
    let store = Arc::new(InMemoryContextStore::new());
    (ContextService::new(Arc::clone(&store)), store)
}

/// Create contexts in order at the bottom of the user's list
pub async fn seed_contexts(service: &MemoryService, user_id: UserId, names: &[&str]) -> Vec<Context> {
    let mut created = Vec::with_capacity(names.len());
    for name in names {
        created.push(
            service
                .create_context(NewContext::new(user_id, *name))
                .await
                .expect("seed context"),
        );
    }
    created
}

/// The user's list as `(name, position)` pairs, top first
pub async fn list_layout(service: &MemoryService, user_id: UserId) -> Vec<(String, i32)> {
    service
        .list(user_id, &ContextScope::new())
        .await
        .expect("list contexts")
        .into_iter()
        .map(|context| (context.name, context.position))
        .collect()
}

pub fn layout(entries: &[(&str, i32)]) -> Vec<(String, i32)> {
    entries
        .iter()
        .map(|(name, position)| (name.to_string(), *position))
        .collect()
}
