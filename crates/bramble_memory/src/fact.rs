//! Facts: identity-tagged, typed payloads.

use std::fmt;
use std::sync::Arc;

use bramble_foundation::{FactId, Payload, Value};

/// An identity-tagged, typed payload in working memory.
///
/// Facts are immutable once stored. [`crate::WorkingMemory`] replaces the
/// shared `Arc<Fact>` on update, keeping `id` (the identity) and `fact_type`
/// stable while the payload and recency advance. Matches hold `Arc<Fact>`
/// snapshots; identity comparisons go through [`Fact::id`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fact {
    id: FactId,
    fact_type: Arc<str>,
    payload: Payload,
    recency: u64,
}

impl Fact {
    /// Constructed by `WorkingMemory`, which owns id allocation and
    /// recency stamping.
    pub(crate) fn new(id: FactId, fact_type: Arc<str>, payload: Payload, recency: u64) -> Self {
        Self {
            id,
            fact_type,
            payload,
            recency,
        }
    }

    /// Returns the fact's identity.
    #[must_use]
    pub fn id(&self) -> FactId {
        self.id
    }

    /// Returns the fact's type. Immutable after insertion.
    #[must_use]
    pub fn fact_type(&self) -> &str {
        &self.fact_type
    }

    pub(crate) fn fact_type_arc(&self) -> Arc<str> {
        Arc::clone(&self.fact_type)
    }

    /// Returns the attribute payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the recency stamp of the last insert or update.
    #[must_use]
    pub fn recency(&self) -> u64 {
        self.recency
    }

    /// Gets a payload attribute by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.fact_type, self.id)
    }
}
