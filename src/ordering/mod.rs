//! # Ordered List Positions
//!
//! Dense, user-scoped ranking for contexts. Positions for one user always form
//! `0..count` with no gaps or duplicates between operations.
//!
//! The routines in [`list_position`] only *plan* changes: they describe which
//! block of positions shifts and where the affected record lands. Stores turn
//! a plan into either in-memory updates or a single ranged `UPDATE` inside a
//! transaction, so both backends share one definition of the list semantics.

pub mod list_position;

pub use list_position::{
    apply_shift, is_dense, plan_insert, plan_move, plan_remove, plan_reposition, ListChange,
    ListMove, ListPositionError, Placement, Positioned, ShiftRange,
};
