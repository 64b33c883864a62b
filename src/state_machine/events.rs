use super::errors::StateMachineError;
use super::states::ContextState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that can trigger context state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextEvent {
    /// Close the context (guarded: no active todos may remain)
    Close,
    /// Hide the context from the normal list views
    Hide,
    /// Bring a closed or hidden context back
    Activate,
}

impl ContextEvent {
    pub const ALL: [ContextEvent; 3] = [Self::Close, Self::Hide, Self::Activate];

    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Hide => "hide",
            Self::Activate => "activate",
        }
    }

    /// States this event may be fired from
    pub fn from_states(&self) -> &'static [ContextState] {
        match self {
            Self::Close => &[ContextState::Active, ContextState::Hidden],
            Self::Hide => &[ContextState::Active, ContextState::Closed],
            Self::Activate => &[ContextState::Closed, ContextState::Hidden],
        }
    }

    /// State the context lands in once the event applies
    pub fn to_state(&self) -> ContextState {
        match self {
            Self::Close => ContextState::Closed,
            Self::Hide => ContextState::Hidden,
            Self::Activate => ContextState::Active,
        }
    }

    /// Whether the transition requires the no-active-todos guard
    pub fn is_guarded(&self) -> bool {
        matches!(self, Self::Close)
    }
}

impl fmt::Display for ContextEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

impl std::str::FromStr for ContextEvent {
    type Err = StateMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "close" => Ok(Self::Close),
            "hide" => Ok(Self::Hide),
            "activate" => Ok(Self::Activate),
            _ => Err(StateMachineError::UnknownEvent {
                name: s.to_string(),
            }),
        }
    }
}
