//! The owned fact store with type indexing and dirty-type tracking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bramble_foundation::{Error, FactId, Payload, Result};

use crate::fact::Fact;

/// Working memory: every live fact, indexed by type.
///
/// A monotonic version counter stamps recency on every insert and update,
/// defining a total order over mutations. Two dirty-type sets track which
/// types changed: `dirty_next` collects mutations as they happen and is
/// promoted into `dirty_current` at the start of each engine cycle, so that
/// rules over stable types can be skipped.
#[derive(Debug, Default)]
pub struct WorkingMemory {
    by_id: HashMap<FactId, Arc<Fact>>,
    by_type: HashMap<Arc<str>, Vec<Arc<Fact>>>,
    next_id: u64,
    version_counter: u64,
    dirty_current: HashSet<Arc<str>>,
    dirty_next: HashSet<Arc<str>>,
}

impl WorkingMemory {
    /// Creates an empty working memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if no facts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Returns the current version counter (the highest recency handed out).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version_counter
    }

    /// Inserts a new fact, assigning its id and recency.
    ///
    /// # Errors
    /// Fails with `MissingType` when `fact_type` is empty.
    pub fn insert(&mut self, fact_type: &str, payload: Payload) -> Result<Arc<Fact>> {
        if fact_type.is_empty() {
            return Err(Error::missing_type());
        }

        self.next_id += 1;
        self.version_counter += 1;

        let type_key = self.intern_type(fact_type);
        let fact = Arc::new(Fact::new(
            FactId::new(self.next_id),
            Arc::clone(&type_key),
            payload,
            self.version_counter,
        ));

        self.by_id.insert(fact.id(), Arc::clone(&fact));
        self.by_type
            .entry(Arc::clone(&type_key))
            .or_default()
            .push(Arc::clone(&fact));
        self.dirty_next.insert(type_key);

        Ok(fact)
    }

    /// Updates a fact by shallow-merging `partial` into its payload and
    /// restamping recency. The fact keeps its id and bucket position.
    ///
    /// # Errors
    /// Fails with `NotFound` when no fact has the given id, and with
    /// `TypeImmutable` when `partial` carries a `"type"` attribute naming a
    /// different type.
    pub fn update(&mut self, id: FactId, partial: Payload) -> Result<Arc<Fact>> {
        let current = self.by_id.get(&id).ok_or_else(|| Error::not_found(id))?;

        let mut partial = partial;
        if let Some(requested) = partial.get("type") {
            if requested.as_str() != Some(current.fact_type()) {
                let attempted = requested
                    .as_str()
                    .map_or_else(|| format!("{requested}"), str::to_string);
                return Err(Error::type_immutable(id, attempted));
            }
            // Same type restated: the type lives outside the payload here.
            partial.remove("type");
        }

        self.version_counter += 1;
        let updated = Arc::new(Fact::new(
            id,
            current.fact_type_arc(),
            current.payload().merge(&partial),
            self.version_counter,
        ));

        let bucket = self
            .by_type
            .get_mut(updated.fact_type())
            .expect("bucket exists for live fact");
        let slot = bucket
            .iter()
            .position(|f| f.id() == id)
            .expect("live fact present in its bucket");
        bucket[slot] = Arc::clone(&updated);

        self.by_id.insert(id, Arc::clone(&updated));
        self.dirty_next.insert(updated.fact_type_arc());

        Ok(updated)
    }

    /// Removes a fact, returning the removed snapshot.
    ///
    /// # Errors
    /// Fails with `NotFound` when no fact has the given id.
    pub fn remove(&mut self, id: FactId) -> Result<Arc<Fact>> {
        let fact = self.by_id.remove(&id).ok_or_else(|| Error::not_found(id))?;

        let bucket = self
            .by_type
            .get_mut(fact.fact_type())
            .expect("bucket exists for live fact");
        bucket.retain(|f| f.id() != id);
        if bucket.is_empty() {
            // Prune so iteration never yields stale types.
            self.by_type.remove(fact.fact_type());
        }

        self.dirty_next.insert(fact.fact_type_arc());
        Ok(fact)
    }

    /// Looks up a fact by id.
    #[must_use]
    pub fn fact(&self, id: FactId) -> Option<&Arc<Fact>> {
        self.by_id.get(&id)
    }

    /// Returns a snapshot of all facts of one type, in insertion order.
    #[must_use]
    pub fn by_type(&self, fact_type: &str) -> Vec<Arc<Fact>> {
        self.by_type.get(fact_type).cloned().unwrap_or_default()
    }

    /// Returns a snapshot of all facts across every type, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Fact>> {
        let mut facts: Vec<Arc<Fact>> = self.by_id.values().cloned().collect();
        facts.sort_by_key(|f| f.id());
        facts
    }

    /// Returns the types currently holding at least one fact.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(AsRef::as_ref)
    }

    /// Folds pending mutations into the current cycle's dirty set.
    pub fn promote_next_dirty(&mut self) {
        self.dirty_current.extend(self.dirty_next.drain());
    }

    /// Clears the current cycle's dirty set.
    pub fn clear_current_dirty(&mut self) {
        self.dirty_current.clear();
    }

    /// Returns true if the type changed in this cycle or since it started.
    #[must_use]
    pub fn is_type_dirty(&self, fact_type: &str) -> bool {
        self.dirty_current.contains(fact_type) || self.dirty_next.contains(fact_type)
    }

    /// Returns the dirty set for the current cycle.
    #[must_use]
    pub fn dirty_current_types(&self) -> &HashSet<Arc<str>> {
        &self.dirty_current
    }

    fn intern_type(&self, fact_type: &str) -> Arc<str> {
        self.by_type
            .get_key_value(fact_type)
            .map_or_else(|| Arc::from(fact_type), |(key, _)| Arc::clone(key))
    }
}
