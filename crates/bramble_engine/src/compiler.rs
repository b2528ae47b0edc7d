//! Condition compiler - transforms the declaration DSL into a node network.
//!
//! Besides producing the evaluable [`Node`] tree, compilation collects the
//! set of fact types referenced at alpha positions and whether any negation
//! appears; both feed the engine's per-cycle scheduling.

use std::collections::HashSet;
use std::sync::Arc;

use bramble_foundation::{Error, Result};

use crate::condition::Condition;
use crate::node::{AccumulatorNode, AlphaNode, BetaTestNode, Node};

// =============================================================================
// Compiled Network
// =============================================================================

/// A compiled condition tree with its scheduling bookkeeping.
#[derive(Debug)]
pub struct Network {
    /// Root of the evaluable node tree.
    pub root: Node,
    /// Fact types appearing at alpha positions anywhere in the tree.
    pub referenced_types: HashSet<String>,
    /// True if any `not` subtree exists. Negated rules are evaluated every
    /// cycle, because absence cannot be tracked through dirty types.
    pub has_negation: bool,
}

// =============================================================================
// Condition Compiler
// =============================================================================

/// Compiles [`Condition`] trees into evaluable networks.
pub struct ConditionCompiler;

impl ConditionCompiler {
    /// Compile a condition tree into a network.
    ///
    /// # Errors
    /// Returns `InvalidDsl` when the condition mixes shapes (a fact matcher
    /// with a composite, a test without a type, more than one composite, a
    /// join test combined with anything else) or is entirely empty.
    pub fn compile(condition: &Condition) -> Result<Network> {
        let mut referenced_types = HashSet::new();
        let mut has_negation = false;
        let root = Self::compile_node(condition, &mut referenced_types, &mut has_negation)?;
        Ok(Network {
            root,
            referenced_types,
            has_negation,
        })
    }

    fn compile_node(
        condition: &Condition,
        referenced_types: &mut HashSet<String>,
        has_negation: &mut bool,
    ) -> Result<Node> {
        Self::validate(condition)?;

        if let Some(join) = &condition.join {
            // Top-level bare join test evaluates over the unit match.
            return Ok(Node::BetaTest(BetaTestNode::new(
                Node::Unit,
                Arc::clone(join),
            )));
        }

        if let Some(fact_type) = &condition.fact_type {
            referenced_types.insert(fact_type.clone());

            if let Some(accumulate) = &condition.accumulate {
                // The accumulator owns the variable binding; the alpha
                // underneath stays unbound.
                let alpha = AlphaNode::new(fact_type.clone(), condition.test.clone(), None);
                return Ok(Node::Accumulator(AccumulatorNode::new(
                    Node::Alpha(alpha),
                    condition.var.clone(),
                    accumulate.clone(),
                )));
            }

            return Ok(Node::Alpha(AlphaNode::new(
                fact_type.clone(),
                condition.test.clone(),
                condition.var.clone(),
            )));
        }

        if let Some(children) = &condition.all {
            return Self::compile_composite(children, Node::All, referenced_types, has_negation);
        }
        if let Some(children) = &condition.any {
            return Self::compile_composite(children, Node::Any, referenced_types, has_negation);
        }
        if let Some(child) = &condition.not {
            *has_negation = true;
            let compiled = Self::compile_node(child, referenced_types, has_negation)?;
            return Ok(Node::Not(Box::new(compiled)));
        }
        if let Some(child) = &condition.exists {
            let compiled = Self::compile_node(child, referenced_types, has_negation)?;
            return Ok(Node::Exists(Box::new(compiled)));
        }

        Err(Error::invalid_dsl("condition is empty"))
    }

    /// Compiles an `all`/`any` child list: fact and composite children form
    /// the base (passed through unwrapped when there is exactly one, `Unit`
    /// when there are none); embedded join tests stack on top in order.
    fn compile_composite(
        children: &[Condition],
        combine: fn(Vec<Node>) -> Node,
        referenced_types: &mut HashSet<String>,
        has_negation: &mut bool,
    ) -> Result<Node> {
        let mut base = Vec::new();
        let mut joins = Vec::new();

        for child in children {
            if let Some(join) = &child.join {
                Self::validate(child)?;
                joins.push(Arc::clone(join));
            } else {
                base.push(Self::compile_node(child, referenced_types, has_negation)?);
            }
        }

        let mut node = match base.len() {
            0 => Node::Unit,
            1 => base.pop().expect("exactly one base child"),
            _ => combine(base),
        };

        for join in joins {
            node = Node::BetaTest(BetaTestNode::new(node, join));
        }

        Ok(node)
    }

    fn validate(condition: &Condition) -> Result<()> {
        let composites = usize::from(condition.all.is_some())
            + usize::from(condition.any.is_some())
            + usize::from(condition.not.is_some())
            + usize::from(condition.exists.is_some());

        if composites > 1 {
            return Err(Error::invalid_dsl(
                "a condition may hold only one of all/any/not/exists",
            ));
        }
        if condition.join.is_some() {
            if condition.fact_type.is_some()
                || condition.test.is_some()
                || condition.var.is_some()
                || condition.accumulate.is_some()
                || composites > 0
            {
                return Err(Error::invalid_dsl(
                    "a join test may not be combined with any other form",
                ));
            }
            return Ok(());
        }
        if condition.fact_type.is_some() {
            if composites > 0 {
                return Err(Error::invalid_dsl(
                    "a fact condition may not also hold a composite form",
                ));
            }
            return Ok(());
        }
        if composites > 0 {
            if condition.test.is_some() {
                return Err(Error::invalid_dsl(
                    "a fact test may not be combined with a composite form",
                ));
            }
            if condition.var.is_some() || condition.accumulate.is_some() {
                return Err(Error::invalid_dsl(
                    "bindings and accumulators require a fact type",
                ));
            }
            return Ok(());
        }
        if condition.test.is_some() {
            return Err(Error::invalid_dsl("a fact test requires a fact type"));
        }
        if condition.var.is_some() || condition.accumulate.is_some() {
            return Err(Error::invalid_dsl(
                "bindings and accumulators require a fact type",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
