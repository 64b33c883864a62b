use crate::models::core::context::Context;
use crate::state_machine::ContextState;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Filter over a user's contexts; results are always in list order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextScope {
    state: Option<ContextState>,
    name_pattern: Option<String>,
}

impl ContextScope {
    /// Every context, regardless of state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(self) -> Self {
        self.in_state(ContextState::Active)
    }

    pub fn hidden(self) -> Self {
        self.in_state(ContextState::Hidden)
    }

    pub fn closed(self) -> Self {
        self.in_state(ContextState::Closed)
    }

    pub fn in_state(mut self, state: ContextState) -> Self {
        self.state = Some(state);
        self
    }

    /// Restrict to names matching a `LIKE` pattern
    pub fn with_name(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = Some(pattern.into());
        self
    }

    pub fn state(&self) -> Option<ContextState> {
        self.state
    }

    pub fn name_pattern(&self) -> Option<&str> {
        self.name_pattern.as_deref()
    }

    /// Compile the scope for in-memory filtering
    pub fn matcher(&self) -> Result<ScopeMatcher, regex::Error> {
        let name = self
            .name_pattern
            .as_deref()
            .map(like_to_regex)
            .transpose()?;

        Ok(ScopeMatcher {
            state: self.state,
            name,
        })
    }
}

/// A compiled [`ContextScope`]
#[derive(Debug, Clone)]
pub struct ScopeMatcher {
    state: Option<ContextState>,
    name: Option<Regex>,
}

impl ScopeMatcher {
    pub fn matches(&self, context: &Context) -> bool {
        self.state.map_or(true, |state| context.state == state)
            && self
                .name
                .as_ref()
                .map_or(true, |name| name.is_match(&context.name))
    }
}

/// Translate a SQL `LIKE` pattern into an anchored, case-insensitive regex
fn like_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push_str("(?is)^");

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    translated.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }

    translated.push('$');
    Regex::new(&translated)
}
