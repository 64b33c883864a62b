pub mod core;

// Re-export core models for easy access
pub use self::core::context::{Context, ContextId, MaybeContext, NewContext, UserId};
pub use self::core::recurring_todo::RecurringTodo;
pub use self::core::todo::{Todo, TodoState};
