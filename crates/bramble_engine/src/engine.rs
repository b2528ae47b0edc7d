//! The rules engine: match-resolve-act to quiescence.
//!
//! Each cycle promotes pending dirty types, evaluates every relevant rule's
//! network into an agenda, resolves conflicts, and fires the resolved
//! entries. Actions mutate working memory through a [`RuleContext`]; their
//! effects surface in the next cycle, because the agenda was built before
//! firing began. The loop ends at a fixed point (empty agenda or nothing
//! fired) or fails once the cycle limit is reached.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use bramble_foundation::{Error, FactId, Payload, Result};
use bramble_memory::{Fact, WorkingMemory};

use crate::agenda::{AgendaEntry, ConflictResolver, default_conflict_resolver, signature};
use crate::query::Query;
use crate::rule::{Rule, RuleDef};
use crate::trace::FiringRecord;

/// Default cycle limit.
const DEFAULT_MAX_CYCLES: usize = 100;

// =============================================================================
// Rule Context
// =============================================================================

/// Mutation surface handed to a firing action.
///
/// Exposes the engine's fact mutators and query access, and records the
/// facts added during the firing so the trace can attribute them.
pub struct RuleContext<'a> {
    memory: &'a mut WorkingMemory,
    added: Vec<Payload>,
}

impl<'a> RuleContext<'a> {
    fn new(memory: &'a mut WorkingMemory) -> Self {
        Self {
            memory,
            added: Vec::new(),
        }
    }

    /// Adds a fact. Visible to rule networks from the next cycle on.
    ///
    /// # Errors
    /// Fails with `MissingType` when `fact_type` is empty.
    pub fn add_fact(&mut self, fact_type: &str, payload: Payload) -> Result<Arc<Fact>> {
        let fact = self.memory.insert(fact_type, payload)?;
        self.added.push(fact.payload().clone());
        Ok(fact)
    }

    /// Updates a fact by shallow payload merge.
    ///
    /// # Errors
    /// Fails with `NotFound` or `TypeImmutable`.
    pub fn update_fact(&mut self, id: FactId, partial: Payload) -> Result<Arc<Fact>> {
        self.memory.update(id, partial)
    }

    /// Removes a fact.
    ///
    /// # Errors
    /// Fails with `NotFound`.
    pub fn remove_fact(&mut self, id: FactId) -> Result<()> {
        self.memory.remove(id)?;
        Ok(())
    }

    /// Looks up a fact by id.
    #[must_use]
    pub fn fact(&self, id: FactId) -> Option<&Arc<Fact>> {
        self.memory.fact(id)
    }

    /// Starts a query over working memory as it stands mid-firing.
    #[must_use]
    pub fn query(&self, fact_type: Option<&str>) -> Query<'_> {
        Query::new(self.memory, fact_type)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The production-rule engine: working memory, rules, and the cycle loop.
pub struct Engine {
    memory: WorkingMemory,
    rules: Vec<Rule>,
    resolver: ConflictResolver,
    fired: HashSet<String>,
    trace_enabled: bool,
    trace: Vec<FiringRecord>,
    max_cycles: usize,
    cycle_count: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: WorkingMemory::new(),
            rules: Vec::new(),
            resolver: Box::new(default_conflict_resolver),
            fired: HashSet::new(),
            trace_enabled: false,
            trace: Vec::new(),
            max_cycles: DEFAULT_MAX_CYCLES,
            cycle_count: 0,
        }
    }

    /// Sets the cycle limit (default 100).
    #[must_use]
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Enables or disables execution tracing.
    #[must_use]
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace_enabled = enabled;
        self
    }

    // --- Facts ---

    /// Adds a fact to working memory.
    ///
    /// # Errors
    /// Fails with `MissingType` when `fact_type` is empty.
    pub fn add_fact(&mut self, fact_type: &str, payload: Payload) -> Result<Arc<Fact>> {
        self.memory.insert(fact_type, payload)
    }

    /// Updates a fact by shallow payload merge.
    ///
    /// # Errors
    /// Fails with `NotFound` or `TypeImmutable`.
    pub fn update_fact(&mut self, id: FactId, partial: Payload) -> Result<Arc<Fact>> {
        self.memory.update(id, partial)
    }

    /// Removes a fact.
    ///
    /// # Errors
    /// Fails with `NotFound`.
    pub fn remove_fact(&mut self, id: FactId) -> Result<()> {
        self.memory.remove(id)?;
        Ok(())
    }

    /// Looks up a fact by id.
    #[must_use]
    pub fn fact(&self, id: FactId) -> Option<&Arc<Fact>> {
        self.memory.fact(id)
    }

    /// Read access to working memory.
    #[must_use]
    pub fn working_memory(&self) -> &WorkingMemory {
        &self.memory
    }

    /// Starts a query over working memory.
    #[must_use]
    pub fn query(&self, fact_type: Option<&str>) -> Query<'_> {
        Query::new(&self.memory, fact_type)
    }

    // --- Rules ---

    /// Compiles and registers a rule, returning the compiled form.
    ///
    /// # Errors
    /// Fails with `InvalidDsl` when the condition tree is ill-formed.
    pub fn add_rule(&mut self, def: RuleDef) -> Result<&Rule> {
        let rule = Rule::compile(&def)?;
        self.rules.push(rule);
        Ok(self.rules.last().expect("rule just pushed"))
    }

    /// Replaces the conflict resolver.
    ///
    /// The resolver receives the raw agenda and the fired-signature set and
    /// returns the entries to fire, in order. Fired signatures are recorded
    /// into the refraction set regardless of the resolver in use.
    pub fn set_conflict_resolver(
        &mut self,
        resolver: impl Fn(Vec<AgendaEntry>, &HashSet<String>) -> Vec<AgendaEntry> + 'static,
    ) {
        self.resolver = Box::new(resolver);
    }

    /// Returns the refraction set: every signature that has fired.
    #[must_use]
    pub fn fired_signatures(&self) -> &HashSet<String> {
        &self.fired
    }

    // --- Trace ---

    /// Returns the firings recorded by the most recent `run`.
    #[must_use]
    pub fn execution_trace(&self) -> &[FiringRecord] {
        &self.trace
    }

    /// Clears the execution trace.
    pub fn clear_execution_trace(&mut self) {
        self.trace.clear();
    }

    /// Returns the number of cycles the most recent `run` used.
    #[must_use]
    pub fn cycle_count(&self) -> usize {
        self.cycle_count
    }

    // --- The cycle loop ---

    /// Runs match-resolve-act cycles until quiescence.
    ///
    /// Quiescence is an empty agenda or a cycle in which nothing fired.
    /// The refraction set persists across runs: a (rule, fact-set) scenario
    /// fires at most once per engine lifetime unless the fact set changes.
    ///
    /// # Errors
    /// Fails with `MaxCyclesExceeded` when the cycle limit is reached, and
    /// propagates any error returned by a firing action.
    pub fn run(&mut self) -> Result<()> {
        self.cycle_count = 0;
        self.trace.clear();

        while self.cycle_count < self.max_cycles {
            self.memory.promote_next_dirty();

            let agenda = self.build_agenda();
            if agenda.is_empty() {
                return Ok(());
            }

            self.cycle_count += 1;
            let resolved = (self.resolver)(agenda, &self.fired);

            let mut fired_any = false;
            for entry in &resolved {
                self.fire(entry)?;
                fired_any = true;
            }
            if !fired_any {
                return Ok(());
            }

            self.memory.clear_current_dirty();
        }

        Err(Error::max_cycles(self.max_cycles))
    }

    /// Evaluates every relevant rule into agenda entries.
    ///
    /// A rule is skipped only when it references at least one type, has no
    /// negation, and none of its referenced types are dirty this cycle;
    /// negated rules always run because absence leaves no dirty trail.
    fn build_agenda(&mut self) -> Vec<AgendaEntry> {
        let memory = &self.memory;
        let mut agenda = Vec::new();

        for rule in &mut self.rules {
            let relevant = rule.referenced_types().is_empty()
                || rule.has_negation()
                || rule
                    .referenced_types()
                    .iter()
                    .any(|t| memory.dirty_current_types().contains(t.as_str()));
            if !relevant {
                continue;
            }

            for matched in rule.matches(memory) {
                let signature = signature(rule.name(), &matched.facts);
                let match_recency = matched.max_recency();
                agenda.push(AgendaEntry {
                    rule_name: rule.name().to_string(),
                    signature,
                    salience: rule.salience(),
                    match_recency,
                    action: rule.action(),
                    matched,
                });
            }
        }

        agenda
    }

    fn fire(&mut self, entry: &AgendaEntry) -> Result<()> {
        let mut ctx = RuleContext::new(&mut self.memory);
        let outcome = (entry.action)(&entry.matched.facts, &mut ctx, &entry.matched.bindings);
        let added = ctx.added;

        // An action error unwinds before the signature is recorded; state
        // already mutated through the context stays committed.
        outcome.map_err(|e| e.with_rule(entry.rule_name.clone()))?;

        self.fired.insert(entry.signature.clone());
        if self.trace_enabled {
            self.trace.push(FiringRecord {
                rule_name: entry.rule_name.clone(),
                timestamp: Utc::now(),
                facts: entry
                    .matched
                    .facts
                    .iter()
                    .map(|f| f.payload().clone())
                    .collect(),
                facts_added: added,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("facts", &self.memory.len())
            .field("rules", &self.rules.len())
            .field("max_cycles", &self.max_cycles)
            .field("trace_enabled", &self.trace_enabled)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
