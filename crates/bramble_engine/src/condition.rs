//! The embedded condition DSL.
//!
//! A [`Condition`] is the declaration form of a rule's left-hand side: a
//! tree of typed fact matchers, composites (`all`/`any`/`not`/`exists`),
//! accumulators, and join tests. Conditions are inert until compiled into a
//! node network by [`crate::compiler::ConditionCompiler`], which also
//! rejects ill-formed shapes.

use std::fmt;
use std::sync::Arc;

use bramble_memory::Fact;

use crate::accumulate::Accumulate;
use crate::binding::Bindings;

/// Predicate applied to a single candidate fact.
pub type FactTest = Arc<dyn Fn(&Fact) -> bool>;

/// Predicate applied to an already-joined partial match.
pub type JoinTest = Arc<dyn Fn(&[Arc<Fact>], &Bindings) -> bool>;

/// Declaration form of a rule condition.
///
/// Exactly one shape must be populated: a typed fact matcher (`fact_type`
/// with optional `test`, `var`, `accumulate`), one composite (`all`, `any`,
/// `not`, `exists`), or a standalone `join` test. The compiler validates
/// this; the fields are public so hosts can build conditions directly.
#[derive(Clone, Default)]
pub struct Condition {
    /// Type of fact to match.
    pub fact_type: Option<String>,
    /// Per-fact predicate over the candidate's payload.
    pub test: Option<FactTest>,
    /// Variable name binding the matched fact (or the accumulated value).
    pub var: Option<String>,
    /// Aggregation over the matched fact set instead of per-fact matches.
    pub accumulate: Option<Accumulate>,
    /// Conjunction of child conditions.
    pub all: Option<Vec<Condition>>,
    /// Disjunction of child conditions.
    pub any: Option<Vec<Condition>>,
    /// Negation: matches when the child has no matches.
    pub not: Option<Box<Condition>>,
    /// Existence: matches once when the child has at least one match.
    pub exists: Option<Box<Condition>>,
    /// Join test over the joined facts and bindings so far.
    pub join: Option<JoinTest>,
}

impl Condition {
    /// A condition matching facts of the given type.
    #[must_use]
    pub fn fact(fact_type: impl Into<String>) -> Self {
        Self {
            fact_type: Some(fact_type.into()),
            ..Self::default()
        }
    }

    /// Adds a per-fact predicate.
    #[must_use]
    pub fn with_test(mut self, test: impl Fn(&Fact) -> bool + 'static) -> Self {
        self.test = Some(Arc::new(test));
        self
    }

    /// Binds the matched fact (or accumulated value) under a variable name.
    #[must_use]
    pub fn bind(mut self, var: impl Into<String>) -> Self {
        self.var = Some(var.into());
        self
    }

    /// Aggregates over the matched fact set instead of emitting per-fact
    /// matches. The variable set by [`Condition::bind`] receives the
    /// accumulated value.
    #[must_use]
    pub fn with_accumulate(mut self, accumulate: Accumulate) -> Self {
        self.accumulate = Some(accumulate);
        self
    }

    /// A conjunction of child conditions.
    #[must_use]
    pub fn all(children: Vec<Condition>) -> Self {
        Self {
            all: Some(children),
            ..Self::default()
        }
    }

    /// A disjunction of child conditions.
    #[must_use]
    pub fn any(children: Vec<Condition>) -> Self {
        Self {
            any: Some(children),
            ..Self::default()
        }
    }

    /// A negation: matches exactly once when the child has no matches.
    #[must_use]
    pub fn not(child: Condition) -> Self {
        Self {
            not: Some(Box::new(child)),
            ..Self::default()
        }
    }

    /// An existence test: matches exactly once when the child matches.
    #[must_use]
    pub fn exists(child: Condition) -> Self {
        Self {
            exists: Some(Box::new(child)),
            ..Self::default()
        }
    }

    /// A standalone join test over the joined facts and bindings.
    #[must_use]
    pub fn join(test: impl Fn(&[Arc<Fact>], &Bindings) -> bool + 'static) -> Self {
        Self {
            join: Some(Arc::new(test)),
            ..Self::default()
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Condition");
        if let Some(t) = &self.fact_type {
            d.field("fact_type", t);
        }
        if self.test.is_some() {
            d.field("test", &"<fn>");
        }
        if let Some(v) = &self.var {
            d.field("var", v);
        }
        if let Some(a) = &self.accumulate {
            d.field("accumulate", a);
        }
        if let Some(children) = &self.all {
            d.field("all", children);
        }
        if let Some(children) = &self.any {
            d.field("any", children);
        }
        if let Some(child) = &self.not {
            d.field("not", child);
        }
        if let Some(child) = &self.exists {
            d.field("exists", child);
        }
        if self.join.is_some() {
            d.field("join", &"<fn>");
        }
        d.finish()
    }
}
