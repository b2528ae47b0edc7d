//! The compiled node network and its evaluation semantics.
//!
//! A rule's condition tree compiles into a tree of [`Node`]s. Evaluation
//! walks the tree against working memory and produces the rule's partial
//! matches. Nodes own their children exclusively; transient state (alpha
//! caches, accumulator state) lives inside the owning node and is keyed to
//! the dirty-type mechanism for invalidation.

use std::collections::HashSet;
use std::sync::Arc;

use bramble_foundation::FactId;
use bramble_memory::{Fact, WorkingMemory};

use crate::accumulate::{Accumulate, AccumulatorState};
use crate::binding::{Binding, Bindings, PartialMatch};
use crate::condition::{FactTest, JoinTest};

/// A node in the compiled network.
#[derive(Debug)]
pub enum Node {
    /// Emits exactly one empty partial match.
    Unit,
    /// Per-type filter producing single-fact matches.
    Alpha(AlphaNode),
    /// Predicate over an already-joined child match.
    BetaTest(BetaTestNode),
    /// Cartesian join of children with consistent bindings.
    All(Vec<Node>),
    /// Concatenation of child matches. No deduplication.
    Any(Vec<Node>),
    /// Emits one empty match when the child has none.
    Not(Box<Node>),
    /// Emits one empty match when the child has at least one.
    Exists(Box<Node>),
    /// Aggregation over the child's matched facts.
    Accumulator(AccumulatorNode),
}

impl Node {
    /// Evaluates this node against working memory, producing all partial
    /// matches. Matches are re-materialized on every evaluation; only the
    /// alpha cache persists, and only while its type stays clean.
    pub fn evaluate(&mut self, wm: &WorkingMemory) -> Vec<PartialMatch> {
        match self {
            Self::Unit => vec![PartialMatch::empty()],
            Self::Alpha(alpha) => alpha.evaluate(wm),
            Self::BetaTest(beta) => beta.evaluate(wm),
            Self::All(children) => evaluate_all(children, wm),
            Self::Any(children) => children.iter_mut().flat_map(|c| c.evaluate(wm)).collect(),
            Self::Not(child) => {
                if child.evaluate(wm).is_empty() {
                    vec![PartialMatch::empty()]
                } else {
                    Vec::new()
                }
            }
            Self::Exists(child) => {
                if child.evaluate(wm).is_empty() {
                    Vec::new()
                } else {
                    vec![PartialMatch::empty()]
                }
            }
            Self::Accumulator(acc) => acc.evaluate(wm),
        }
    }
}

/// Left-to-right join of child results, dropping combinations whose
/// bindings conflict. Empty when any child is empty.
fn evaluate_all(children: &mut [Node], wm: &WorkingMemory) -> Vec<PartialMatch> {
    let mut joined = vec![PartialMatch::empty()];
    for child in children {
        let rights = child.evaluate(wm);
        if rights.is_empty() {
            return Vec::new();
        }
        let mut next = Vec::with_capacity(joined.len() * rights.len());
        for left in &joined {
            for right in &rights {
                if let Some(merged) = left.unify(right) {
                    next.push(merged);
                }
            }
        }
        if next.is_empty() {
            return Vec::new();
        }
        joined = next;
    }
    joined
}

// =============================================================================
// Alpha
// =============================================================================

/// Per-type filter producing single-fact partial matches.
pub struct AlphaNode {
    fact_type: String,
    test: Option<FactTest>,
    var: Option<String>,
    /// Last result, reusable while the type stays clean.
    cache: Option<Vec<PartialMatch>>,
}

impl AlphaNode {
    pub(crate) fn new(fact_type: String, test: Option<FactTest>, var: Option<String>) -> Self {
        Self {
            fact_type,
            test,
            var,
            cache: None,
        }
    }

    /// Returns the type this node filters on.
    #[must_use]
    pub fn fact_type(&self) -> &str {
        &self.fact_type
    }

    fn evaluate(&mut self, wm: &WorkingMemory) -> Vec<PartialMatch> {
        if !wm.is_type_dirty(&self.fact_type) {
            if let Some(cached) = &self.cache {
                return cached.clone();
            }
        }

        let matches: Vec<PartialMatch> = wm
            .by_type(&self.fact_type)
            .into_iter()
            .filter(|fact| self.test.as_ref().is_none_or(|test| test(fact)))
            .map(|fact| PartialMatch::single(fact, self.var.as_deref()))
            .collect();

        self.cache = Some(matches.clone());
        matches
    }
}

impl std::fmt::Debug for AlphaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaNode")
            .field("fact_type", &self.fact_type)
            .field("test", &self.test.as_ref().map(|_| "<fn>"))
            .field("var", &self.var)
            .finish()
    }
}

// =============================================================================
// Beta test
// =============================================================================

/// Filters child matches through a join predicate.
pub struct BetaTestNode {
    child: Box<Node>,
    test: JoinTest,
}

impl BetaTestNode {
    pub(crate) fn new(child: Node, test: JoinTest) -> Self {
        Self {
            child: Box::new(child),
            test,
        }
    }

    fn evaluate(&mut self, wm: &WorkingMemory) -> Vec<PartialMatch> {
        self.child
            .evaluate(wm)
            .into_iter()
            .filter(|m| (self.test)(&m.facts, &m.bindings))
            .collect()
    }
}

impl std::fmt::Debug for BetaTestNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BetaTestNode")
            .field("child", &self.child)
            .finish()
    }
}

// =============================================================================
// Accumulator
// =============================================================================

/// Aggregates the child's matched facts into a single bound value.
pub struct AccumulatorNode {
    child: Box<Node>,
    var: Option<String>,
    aggregate: Accumulate,
    state: AccumulatorState,
}

impl AccumulatorNode {
    pub(crate) fn new(child: Node, var: Option<String>, aggregate: Accumulate) -> Self {
        Self {
            child: Box::new(child),
            var,
            aggregate,
            state: AccumulatorState::default(),
        }
    }

    fn evaluate(&mut self, wm: &WorkingMemory) -> Vec<PartialMatch> {
        let facts: Vec<Arc<Fact>> = self
            .child
            .evaluate(wm)
            .into_iter()
            .flat_map(|m| m.facts)
            .collect();

        let value = match &self.aggregate {
            Accumulate::Batch { fold, test } => {
                let value = fold(&facts);
                if !test(&value) {
                    return Vec::new();
                }
                value
            }
            Accumulate::Incremental {
                init,
                reduce,
                retract,
                convert,
                test,
            } => {
                let state = &mut self.state;
                let mut folded = state.state.take().unwrap_or_else(|| init());

                let current: HashSet<FactId> = facts.iter().map(|f| f.id()).collect();
                let removed: Vec<Arc<Fact>> = state
                    .seen
                    .values()
                    .filter(|f| !current.contains(&f.id()))
                    .cloned()
                    .collect();

                if !removed.is_empty() {
                    if let Some(retract) = retract {
                        for fact in &removed {
                            folded = retract(folded, fact);
                            state.seen.remove(&fact.id());
                        }
                    } else {
                        // No retract provided: rebuild from scratch over the
                        // current fact set.
                        folded = init();
                        state.seen.clear();
                    }
                }

                for fact in &facts {
                    if !state.seen.contains_key(&fact.id()) {
                        folded = reduce(folded, fact);
                        state.seen.insert(fact.id(), Arc::clone(fact));
                    }
                }

                state.state = Some(folded.clone());
                let value = match convert {
                    Some(convert) => convert(folded),
                    None => folded,
                };
                if !test(&value) {
                    return Vec::new();
                }
                value
            }
        };

        let mut bindings = Bindings::new();
        if let Some(var) = &self.var {
            bindings.set(var.clone(), Binding::Value(value.clone()));
        }
        vec![PartialMatch {
            facts,
            bindings,
            accumulator_result: Some(value),
        }]
    }
}

impl std::fmt::Debug for AccumulatorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumulatorNode")
            .field("child", &self.child)
            .field("var", &self.var)
            .field("aggregate", &self.aggregate)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
