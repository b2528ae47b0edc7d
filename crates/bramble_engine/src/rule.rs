//! Rule declarations and compiled rules.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bramble_foundation::Result;
use bramble_memory::{Fact, WorkingMemory};

use crate::binding::{Bindings, PartialMatch};
use crate::compiler::{ConditionCompiler, Network};
use crate::condition::Condition;
use crate::engine::RuleContext;

/// The right-hand side of a rule: runs with the matched facts, a mutation
/// context, and the match's variable bindings.
pub type Action = Arc<dyn Fn(&[Arc<Fact>], &mut RuleContext<'_>, &Bindings) -> Result<()>>;

// =============================================================================
// Rule Definition
// =============================================================================

/// Declaration of a rule: name, conditions, and action, before compilation.
#[derive(Clone)]
pub struct RuleDef {
    /// Rule name. Uniqueness is the caller's responsibility.
    pub name: String,
    /// Priority (higher fires first). Defaults to 0.
    pub salience: i32,
    /// Condition tree forming the left-hand side.
    pub conditions: Condition,
    /// Action fired for each resolved match.
    pub action: Action,
}

impl RuleDef {
    /// Creates a rule definition with default salience.
    pub fn new(
        name: impl Into<String>,
        conditions: Condition,
        action: impl Fn(&[Arc<Fact>], &mut RuleContext<'_>, &Bindings) -> Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            salience: 0,
            conditions,
            action: Arc::new(action),
        }
    }

    /// Sets the salience (priority).
    #[must_use]
    pub fn with_salience(mut self, salience: i32) -> Self {
        self.salience = salience;
        self
    }
}

impl fmt::Debug for RuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDef")
            .field("name", &self.name)
            .field("salience", &self.salience)
            .field("conditions", &self.conditions)
            .finish()
    }
}

// =============================================================================
// Compiled Rule
// =============================================================================

/// A compiled rule ready for matching and firing.
pub struct Rule {
    name: String,
    salience: i32,
    network: Network,
    action: Action,
}

impl Rule {
    /// Compiles a rule definition.
    ///
    /// # Errors
    /// Returns `InvalidDsl` (annotated with the rule name) when the
    /// condition tree is ill-formed.
    pub fn compile(def: &RuleDef) -> Result<Self> {
        let network = ConditionCompiler::compile(&def.conditions)
            .map_err(|e| e.with_rule(def.name.clone()))?;
        Ok(Self {
            name: def.name.clone(),
            salience: def.salience,
            network,
            action: Arc::clone(&def.action),
        })
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the salience (priority).
    #[must_use]
    pub fn salience(&self) -> i32 {
        self.salience
    }

    /// Returns the fact types referenced at alpha positions.
    #[must_use]
    pub fn referenced_types(&self) -> &HashSet<String> {
        &self.network.referenced_types
    }

    /// Returns true if any `not` subtree exists.
    #[must_use]
    pub fn has_negation(&self) -> bool {
        self.network.has_negation
    }

    pub(crate) fn action(&self) -> Action {
        Arc::clone(&self.action)
    }

    /// Evaluates the rule's network, producing all current partial matches.
    pub fn matches(&mut self, wm: &WorkingMemory) -> Vec<PartialMatch> {
        self.network.root.evaluate(wm)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("salience", &self.salience)
            .field("referenced_types", &self.network.referenced_types)
            .field("has_negation", &self.network.has_negation)
            .finish()
    }
}
