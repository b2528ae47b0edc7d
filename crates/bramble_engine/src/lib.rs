//! Rule engine, condition DSL, and queries for Bramble.
//!
//! This crate provides:
//! - [`Condition`] - The embedded condition DSL
//! - [`ConditionCompiler`] - Compiles conditions into node networks
//! - [`Engine`] - The match-resolve-act cycle with conflict resolution,
//!   refraction, and tracing
//! - [`Query`] - Fluent filter/limit over working memory
//! - [`Accumulate`] - Aggregation contracts for accumulator conditions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod accumulate;
pub mod agenda;
pub mod binding;
pub mod compiler;
pub mod condition;
pub mod engine;
pub mod node;
pub mod query;
pub mod rule;
pub mod trace;

// Accumulators
pub use accumulate::Accumulate;

// Agenda and conflict resolution
pub use agenda::{AgendaEntry, ConflictResolver, default_conflict_resolver, signature};

// Bindings and matches
pub use binding::{Binding, Bindings, PartialMatch};

// Compilation
pub use compiler::{ConditionCompiler, Network};

// The condition DSL
pub use condition::{Condition, FactTest, JoinTest};

// The engine
pub use engine::{Engine, RuleContext};

// The node network
pub use node::Node;

// Queries
pub use query::Query;

// Rules
pub use rule::{Action, Rule, RuleDef};

// Tracing
pub use trace::FiringRecord;
