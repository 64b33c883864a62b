// State machine module for context lifecycle management
//
// Contexts move between active, hidden and closed through an explicit
// transition table. Closing is guarded by the context's active todo count,
// which is supplied through the `ActiveTaskCounter` capability.

pub mod context_state_machine;
pub mod errors;
pub mod events;
pub mod guards;
pub mod states;

// Re-export main types for convenient access
pub use context_state_machine::{ContextStateMachine, Transition, TransitionTable};
pub use errors::{GuardError, StateMachineError};
pub use events::ContextEvent;
pub use states::ContextState;

// Common traits and utilities
pub use guards::{ActiveTaskCounter, NoActiveTasksGuard, StateGuard};
