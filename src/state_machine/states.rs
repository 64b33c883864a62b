use crate::constants::context_states;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Context lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextState {
    /// Initial state; the context is listed and usable
    Active,
    /// Finished with; only reachable once no active todos remain
    Closed,
    /// Kept but suppressed from the normal list views
    Hidden,
}

impl ContextState {
    pub const ALL: [ContextState; 3] = [Self::Active, Self::Closed, Self::Hidden];

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    /// Persisted column value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => context_states::ACTIVE,
            Self::Closed => context_states::CLOSED,
            Self::Hidden => context_states::HIDDEN,
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContextState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            context_states::ACTIVE => Ok(Self::Active),
            context_states::CLOSED => Ok(Self::Closed),
            context_states::HIDDEN => Ok(Self::Hidden),
            _ => Err(format!("Invalid context state: {s}")),
        }
    }
}

/// Default state for new contexts
impl Default for ContextState {
    fn default() -> Self {
        Self::Active
    }
}
