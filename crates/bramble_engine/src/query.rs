//! Fluent queries over working-memory contents.

use std::sync::Arc;

use bramble_memory::{Fact, WorkingMemory};

/// Fluent filter + limit over facts, by type or across all of working
/// memory. Results follow working-memory iteration order.
pub struct Query<'a> {
    memory: &'a WorkingMemory,
    fact_type: Option<String>,
    predicate: Option<Box<dyn Fn(&Fact) -> bool + 'a>>,
    limit: Option<usize>,
}

impl<'a> Query<'a> {
    /// Starts a query over the given working memory, optionally narrowed
    /// to one fact type.
    #[must_use]
    pub fn new(memory: &'a WorkingMemory, fact_type: Option<&str>) -> Self {
        Self {
            memory,
            fact_type: fact_type.map(str::to_string),
            predicate: None,
            limit: None,
        }
    }

    /// Keeps only facts satisfying the predicate.
    #[must_use]
    pub fn filter(mut self, predicate: impl Fn(&Fact) -> bool + 'a) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Keeps at most the first `n` results.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Executes the query and returns the matching facts.
    #[must_use]
    pub fn execute(self) -> Vec<Arc<Fact>> {
        let base = match &self.fact_type {
            Some(t) => self.memory.by_type(t),
            None => self.memory.all(),
        };

        let filtered = base
            .into_iter()
            .filter(|fact| self.predicate.as_ref().is_none_or(|p| p(fact)));

        match self.limit {
            Some(n) => filtered.take(n).collect(),
            None => filtered.collect(),
        }
    }
}
