#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Context Core
//!
//! Lifecycle and ordering core for task-list contexts.
//!
//! ## Overview
//!
//! A context is a named, user-owned grouping of todos. Each context carries a
//! lifecycle state (`active`, `hidden`, `closed`) and a position in its
//! owner's list. This crate owns the rules around both:
//!
//! - **Lifecycle**: an explicit transition table, with `close` guarded by the
//!   context's active todo count
//! - **Ordering**: positions stay dense (`0..count`) for each user across
//!   insert, reposition and delete
//! - **Identity**: names are required, at most 255 characters, and unique per user
//! - **Absence**: lookups return [`MaybeContext`] rather than an optional record
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Context states, events, guards and the transition table
//! - [`ordering`] - Dense list position planning
//! - [`models`] - Context, todo and recurring todo records
//! - [`store`] - Persistence trait with in-memory and Postgres implementations
//! - [`services`] - The operations callers use
//! - [`scopes`] - State and name filters for listing contexts
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use context_core::models::NewContext;
//! use context_core::ordering::Placement;
//! use context_core::services::ContextService;
//! use context_core::store::InMemoryContextStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), context_core::ContextError> {
//! let service = ContextService::new(Arc::new(InMemoryContextStore::new()));
//!
//! let home = service.create_context(NewContext::new(1, "Home")).await?;
//! let work = service
//!     .create_context(NewContext::new(1, "Work").at(Placement::Top))
//!     .await?;
//! assert_eq!(work.position, 0);
//!
//! let hidden = service.hide(home.id).await?;
//! assert!(hidden.is_hidden());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                      # Unit and in-memory integration tests
//! cargo test --features test-db   # Adds the Postgres suite (needs DATABASE_URL)
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod ordering;
pub mod scopes;
pub mod services;
pub mod state_machine;
pub mod store;
pub mod validation;

pub use config::{ConfigManager, ContextConfig, DatabaseConfig, LoggingConfig, OrderingConfig};
pub use error::{ContextError, ContextResult, ValidationErrorKind};
pub use models::{Context, ContextId, MaybeContext, NewContext, UserId};
pub use ordering::{ListMove, Placement};
pub use scopes::ContextScope;
pub use services::ContextService;
pub use state_machine::{ContextEvent, ContextState};
pub use store::{ContextStore, InMemoryContextStore, PgContextStore, StoreError};
