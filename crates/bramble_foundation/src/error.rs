//! Error types for the Bramble engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use thiserror::Error;

use crate::ident::FactId;

/// The main error type for Bramble operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// The rule being compiled or fired when the error occurred, if any.
    pub rule: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, rule: None }
    }

    /// Attaches the name of the rule the error occurred in.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Creates an ill-formed condition tree error.
    #[must_use]
    pub fn invalid_dsl(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDsl(reason.into()))
    }

    /// Creates a missing fact type error.
    #[must_use]
    pub fn missing_type() -> Self {
        Self::new(ErrorKind::MissingType)
    }

    /// Creates a type immutability violation error.
    #[must_use]
    pub fn type_immutable(id: FactId, attempted: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeImmutable {
            id,
            attempted: attempted.into(),
        })
    }

    /// Creates a fact not found error.
    #[must_use]
    pub fn not_found(id: FactId) -> Self {
        Self::new(ErrorKind::NotFound(id))
    }

    /// Creates a cycle limit exceeded error.
    #[must_use]
    pub fn max_cycles(limit: usize) -> Self {
        Self::new(ErrorKind::MaxCyclesExceeded { limit })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Compile-time rejection of an ill-formed condition tree.
    #[error("invalid condition: {0}")]
    InvalidDsl(String),

    /// A fact was declared without a type.
    #[error("fact type is missing or empty")]
    MissingType,

    /// An update attempted to change a fact's type.
    #[error("fact {id} cannot change type to {attempted}; types are immutable")]
    TypeImmutable {
        /// The fact whose type was challenged.
        id: FactId,
        /// The type the update attempted to set.
        attempted: String,
    },

    /// No fact exists with the given id.
    #[error("no fact with id {0}")]
    NotFound(FactId),

    /// The engine reached its cycle limit without quiescing.
    #[error("max cycles ({limit}) exceeded without reaching a fixed point")]
    MaxCyclesExceeded {
        /// The configured cycle limit.
        limit: usize,
    },

    /// An action failed with a host-supplied error message.
    #[error("action failed: {0}")]
    Action(String),
}
