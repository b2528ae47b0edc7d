//! Variable bindings and partial matches flowing through the node network.

use std::collections::HashMap;
use std::sync::Arc;

use bramble_foundation::Value;
use bramble_memory::Fact;

/// A single bound value: a fact reference or an accumulated value.
#[derive(Clone, Debug)]
pub enum Binding {
    /// A fact bound by an alpha condition's `var`.
    Fact(Arc<Fact>),
    /// A scalar bound by an accumulator's `var`.
    Value(Value),
}

impl Binding {
    /// Returns the bound fact, if this binding holds one.
    #[must_use]
    pub fn as_fact(&self) -> Option<&Arc<Fact>> {
        match self {
            Self::Fact(f) => Some(f),
            Self::Value(_) => None,
        }
    }

    /// Returns the bound value, if this binding holds one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Fact(_) => None,
        }
    }

    /// Whether two bindings for the same variable can coexist.
    ///
    /// Facts compare by identity, accumulated values by equality.
    fn compatible(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fact(a), Self::Fact(b)) => a.id() == b.id(),
            (Self::Value(a), Self::Value(b)) => a == b,
            _ => false,
        }
    }
}

/// Variable bindings accumulated along a partial match.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    values: HashMap<String, Binding>,
}

impl Bindings {
    /// Creates empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no variables are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Gets a binding by variable name.
    #[must_use]
    pub fn get(&self, var: &str) -> Option<&Binding> {
        self.values.get(var)
    }

    /// Gets the fact bound under a variable name.
    #[must_use]
    pub fn fact(&self, var: &str) -> Option<&Arc<Fact>> {
        self.values.get(var).and_then(Binding::as_fact)
    }

    /// Gets the value bound under a variable name.
    #[must_use]
    pub fn value(&self, var: &str) -> Option<&Value> {
        self.values.get(var).and_then(Binding::as_value)
    }

    /// Sets a binding.
    pub fn set(&mut self, var: impl Into<String>, binding: Binding) {
        self.values.insert(var.into(), binding);
    }

    /// Iterates all bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Binding)> {
        self.values.iter()
    }
}

/// A candidate match flowing through the node network: the contributing
/// facts in network traversal order, plus the variable bindings.
#[derive(Clone, Debug, Default)]
pub struct PartialMatch {
    /// Facts contributing to the match, in left-to-right network order.
    pub facts: Vec<Arc<Fact>>,
    /// Variable bindings.
    pub bindings: Bindings,
    /// The value produced by an accumulator condition, when one fired.
    pub accumulator_result: Option<Value>,
}

impl PartialMatch {
    /// The empty match: no facts, no bindings.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single-fact match, optionally binding the fact under `var`.
    #[must_use]
    pub fn single(fact: Arc<Fact>, var: Option<&str>) -> Self {
        let mut bindings = Bindings::new();
        if let Some(var) = var {
            bindings.set(var, Binding::Fact(Arc::clone(&fact)));
        }
        Self {
            facts: vec![fact],
            bindings,
            accumulator_result: None,
        }
    }

    /// Merges two partial matches.
    ///
    /// Facts concatenate left-to-right. Bindings merge; a variable already
    /// bound must agree (fact identity, value equality) or unification
    /// fails and `None` is returned.
    #[must_use]
    pub fn unify(&self, other: &PartialMatch) -> Option<PartialMatch> {
        let mut bindings = self.bindings.clone();
        for (var, binding) in other.bindings.iter() {
            match bindings.get(var) {
                None => bindings.set(var.clone(), binding.clone()),
                Some(existing) if existing.compatible(binding) => {}
                Some(_) => return None,
            }
        }

        let mut facts = self.facts.clone();
        facts.extend(other.facts.iter().cloned());

        Some(PartialMatch {
            facts,
            bindings,
            accumulator_result: other
                .accumulator_result
                .clone()
                .or_else(|| self.accumulator_result.clone()),
        })
    }

    /// The highest recency among contributing facts, or 0 for an empty match.
    #[must_use]
    pub fn max_recency(&self) -> u64 {
        self.facts.iter().map(|f| f.recency()).max().unwrap_or(0)
    }
}
