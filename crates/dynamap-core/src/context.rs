//! Per-call state threaded through a schema traversal.

use std::fmt;

use dynamap_model::types::ReturnValue;

use crate::clock::Clock;
use crate::expression::Condition;

/// The model operation being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `GetItem`
    Get,
    /// `DeleteItem`
    Delete,
    /// Unconditional `PutItem`.
    Put,
    /// `PutItem` that must not overwrite.
    Create,
    /// `PutItem` that must overwrite.
    Replace,
    /// `UpdateItem`
    Update,
}

impl Action {
    /// Lowercase action name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Delete => "delete",
            Self::Put => "put",
            Self::Create => "create",
            Self::Replace => "replace",
            Self::Update => "update",
        }
    }

    /// Returns `true` for actions that write a whole item.
    #[must_use]
    pub fn is_put(self) -> bool {
        matches!(self, Self::Put | Self::Create | Self::Replace)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller options for one model operation.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    /// Extra conditions, AND-ed after the ones fields add.
    pub conditions: Vec<Condition>,
    /// `ReturnValues` for writes; falls back to the model config.
    pub return_values: Option<ReturnValue>,
    /// Consistent read for `get`; falls back to the model config.
    pub consistent_read: Option<bool>,
}

impl ModelOptions {
    /// Add a caller condition.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Request `ReturnValues`.
    #[must_use]
    pub fn return_values(mut self, return_values: ReturnValue) -> Self {
        self.return_values = Some(return_values);
        self
    }

    /// Request a consistent read.
    #[must_use]
    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }
}

/// Mutable state shared by every field during one traversal.
#[derive(Debug)]
pub struct ModelContext<'a> {
    /// Operation being compiled.
    pub action: Action,
    /// Name of the model being mapped.
    pub model: &'a str,
    /// Conditions fields append to, in traversal order.
    pub conditions: Vec<Condition>,
    /// Caller options.
    pub options: &'a ModelOptions,
    /// Time source for computed dates.
    pub clock: &'a dyn Clock,
}

impl<'a> ModelContext<'a> {
    /// Start a traversal with no accumulated conditions.
    #[must_use]
    pub fn new(
        action: Action,
        model: &'a str,
        options: &'a ModelOptions,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            action,
            model,
            conditions: Vec::new(),
            options,
            clock,
        }
    }
}
