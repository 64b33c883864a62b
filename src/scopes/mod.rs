//! # Query Scopes Module
//!
//! Chainable filters over a user's contexts.
//!
//! ```rust
//! use context_core::scopes::ContextScope;
//!
//! // Active contexts whose name starts with "ho", case-insensitively
//! let scope = ContextScope::new().active().with_name("ho%");
//! assert_eq!(scope.name_pattern(), Some("ho%"));
//! ```
//!
//! Name patterns use SQL `LIKE` wildcards (`%`, `_`, backslash escapes) and
//! match case-insensitively in every store.

pub mod context;

pub use context::{ContextScope, ScopeMatcher};
