//! Proptest strategies for list operations

use proptest::prelude::*;

/// A list operation addressed by index into the user's current list
#[derive(Debug, Clone)]
pub enum ListOp {
    Insert { at_top: bool },
    Delete { index: usize },
    Reposition { index: usize, target: usize },
    MoveHigher { index: usize },
    MoveLower { index: usize },
}

pub fn list_op_strategy() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        3 => any::<bool>().prop_map(|at_top| ListOp::Insert { at_top }),
        1 => any::<usize>().prop_map(|index| ListOp::Delete { index }),
        2 => (any::<usize>(), any::<usize>())
            .prop_map(|(index, target)| ListOp::Reposition { index, target }),
        1 => any::<usize>().prop_map(|index| ListOp::MoveHigher { index }),
        1 => any::<usize>().prop_map(|index| ListOp::MoveLower { index }),
    ]
}

pub fn list_ops_strategy() -> impl Strategy<Value = Vec<ListOp>> {
    prop::collection::vec(list_op_strategy(), 1..40)
}
