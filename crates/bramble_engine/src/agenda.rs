//! Agenda entries and conflict resolution.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bramble_memory::Fact;

use crate::binding::PartialMatch;
use crate::rule::Action;

// =============================================================================
// Agenda Entry
// =============================================================================

/// A single candidate firing: a rule matched against a concrete fact set.
#[derive(Clone)]
pub struct AgendaEntry {
    /// Name of the matched rule.
    pub rule_name: String,
    /// The partial match that activated the rule.
    pub matched: PartialMatch,
    /// Refraction signature: rule name plus the sorted matched fact ids.
    pub signature: String,
    /// The rule's salience.
    pub salience: i32,
    /// Highest recency among matched facts (0 for an empty match).
    pub match_recency: u64,
    pub(crate) action: Action,
}

impl fmt::Debug for AgendaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgendaEntry")
            .field("rule_name", &self.rule_name)
            .field("signature", &self.signature)
            .field("salience", &self.salience)
            .field("match_recency", &self.match_recency)
            .finish()
    }
}

/// Builds the refraction signature for a rule and its matched fact set.
///
/// The signature identifies the scenario by the set of fact ids, not their
/// order: `"<rule>::<sorted ids joined by ','>"`.
#[must_use]
pub fn signature(rule_name: &str, facts: &[Arc<Fact>]) -> String {
    let mut ids: Vec<u64> = facts.iter().map(|f| f.id().raw()).collect();
    ids.sort_unstable();
    let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
    format!("{rule_name}::{}", ids.join(","))
}

// =============================================================================
// Conflict Resolution
// =============================================================================

/// Orders (and may filter) an agenda for firing.
///
/// Receives the raw agenda and the set of already-fired signatures; returns
/// the entries to fire, in order. The engine records fired signatures into
/// the refraction set regardless of what the resolver returns.
pub type ConflictResolver = Box<dyn Fn(Vec<AgendaEntry>, &HashSet<String>) -> Vec<AgendaEntry>>;

/// The default conflict resolution policy.
///
/// Drops entries whose signature already fired (refraction), then orders by
/// salience descending, match recency descending, and signature ascending
/// as the final tie-break.
#[must_use]
pub fn default_conflict_resolver(
    agenda: Vec<AgendaEntry>,
    fired: &HashSet<String>,
) -> Vec<AgendaEntry> {
    let mut remaining: Vec<AgendaEntry> = agenda
        .into_iter()
        .filter(|entry| !fired.contains(&entry.signature))
        .collect();

    remaining.sort_by(|a, b| {
        b.salience
            .cmp(&a.salience)
            .then_with(|| b.match_recency.cmp(&a.match_recency))
            .then_with(|| a.signature.cmp(&b.signature))
    });

    remaining
}
