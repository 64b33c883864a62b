//! # System Constants
//!
//! Core constants that define the operational boundaries of contexts: name
//! limits, list numbering, and the persisted string forms of states.

/// Maximum number of characters allowed in a context name
pub const MAX_NAME_LENGTH: usize = 255;

/// Position of the first entry in a user's context list
pub const TOP_OF_LIST: i32 = 0;

/// Persisted column values for context states
pub mod context_states {
    pub const ACTIVE: &str = "active";
    pub const CLOSED: &str = "closed";
    pub const HIDDEN: &str = "hidden";

    pub const ALL: [&str; 3] = [ACTIVE, CLOSED, HIDDEN];
}

/// Persisted column values for todo states
pub mod todo_states {
    pub const ACTIVE: &str = "active";
    pub const COMPLETED: &str = "completed";
    pub const DEFERRED: &str = "deferred";
    pub const PENDING: &str = "pending";
}

/// Structured log operation names used by the service layer
pub mod operations {
    pub const CREATE: &str = "context.create";
    pub const RENAME: &str = "context.rename";
    pub const TRANSITION: &str = "context.transition";
    pub const REPOSITION: &str = "context.reposition";
    pub const DELETE: &str = "context.delete";
}

/// Unique constraint names shared by the stores and the migrations
pub mod constraints {
    pub const UNIQUE_NAME_PER_USER: &str = "index_contexts_on_user_id_and_name";
}
