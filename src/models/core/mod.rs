pub mod context;
pub mod recurring_todo;
pub mod todo;
