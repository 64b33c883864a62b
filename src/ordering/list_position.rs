use crate::constants::TOP_OF_LIST;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Anything carrying a list position
pub trait Positioned {
    fn position(&self) -> i32;
    fn set_position(&mut self, position: i32);
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPositionError {
    #[error("Position {requested} out of range for a list of {count} entries")]
    OutOfRange { requested: i32, count: i32 },
}

/// Insertion point for new entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Position 0; every existing entry moves down one slot
    Top,
    /// Appended after the last entry
    #[default]
    Bottom,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Bottom => write!(f, "bottom"),
        }
    }
}

impl std::str::FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            _ => Err(format!("Invalid placement: {s}")),
        }
    }
}

/// Relative moves built on top of [`plan_reposition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMove {
    ToTop,
    ToBottom,
    Higher,
    Lower,
}

/// Positions in `from..=to` (unbounded when `to` is `None`) move by `delta`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRange {
    pub from: i32,
    pub to: Option<i32>,
    pub delta: i32,
}

impl ShiftRange {
    pub fn contains(&self, position: i32) -> bool {
        position >= self.from && self.to.map_or(true, |to| position <= to)
    }

    pub fn shifted(&self, position: i32) -> i32 {
        if self.contains(position) {
            position + self.delta
        } else {
            position
        }
    }
}

/// Where a record lands and which neighbours shift to make room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListChange {
    pub position: i32,
    pub shift: Option<ShiftRange>,
}

impl ListChange {
    pub fn is_noop_for(&self, current: i32) -> bool {
        self.shift.is_none() && self.position == current
    }
}

/// Plan inserting a new entry into a list of `count` entries
pub fn plan_insert(count: i32, placement: Placement) -> ListChange {
    match placement {
        Placement::Bottom => ListChange {
            position: count,
            shift: None,
        },
        Placement::Top => ListChange {
            position: TOP_OF_LIST,
            shift: (count > 0).then_some(ShiftRange {
                from: TOP_OF_LIST,
                to: None,
                delta: 1,
            }),
        },
    }
}

/// Plan closing the gap left by removing the entry at `position`
pub fn plan_remove(position: i32) -> ShiftRange {
    ShiftRange {
        from: position + 1,
        to: None,
        delta: -1,
    }
}

/// Plan moving the entry at `current` to `target` in a list of `count` entries.
///
/// Moving down, entries in `(current, target]` move up one slot. Moving up,
/// entries in `[target, current)` move down one slot. The moved entry itself
/// is never inside the shifted range.
pub fn plan_reposition(
    current: i32,
    target: i32,
    count: i32,
) -> Result<ListChange, ListPositionError> {
    if target < TOP_OF_LIST || target >= count {
        return Err(ListPositionError::OutOfRange {
            requested: target,
            count,
        });
    }

    let shift = match target.cmp(&current) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(ShiftRange {
            from: current + 1,
            to: Some(target),
            delta: -1,
        }),
        std::cmp::Ordering::Less => Some(ShiftRange {
            from: target,
            to: Some(current - 1),
            delta: 1,
        }),
    };

    Ok(ListChange {
        position: target,
        shift,
    })
}

/// Resolve a relative move to an absolute target, clamped to the list bounds
pub fn plan_move(
    list_move: ListMove,
    current: i32,
    count: i32,
) -> Result<ListChange, ListPositionError> {
    let last = count - 1;
    let target = match list_move {
        ListMove::ToTop => TOP_OF_LIST,
        ListMove::ToBottom => last,
        ListMove::Higher => (current - 1).max(TOP_OF_LIST),
        ListMove::Lower => (current + 1).min(last),
    };

    plan_reposition(current, target, count)
}

/// Apply a shift to every entry it covers
pub fn apply_shift<'a, T, I>(items: I, shift: &ShiftRange)
where
    T: Positioned + 'a,
    I: IntoIterator<Item = &'a mut T>,
{
    for item in items {
        let current = item.position();
        if shift.contains(current) {
            item.set_position(current + shift.delta);
        }
    }
}

/// Whether `positions` is exactly `0..n` with no duplicates
pub fn is_dense(positions: impl IntoIterator<Item = i32>) -> bool {
    let mut seen = BTreeSet::new();
    for position in positions {
        if !seen.insert(position) {
            return false;
        }
    }

    seen.into_iter()
        .zip(TOP_OF_LIST..)
        .all(|(actual, expected)| actual == expected)
}
