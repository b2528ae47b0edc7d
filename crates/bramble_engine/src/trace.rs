//! Execution trace records.

use chrono::{DateTime, Utc};

use bramble_foundation::Payload;

/// Record of a single rule firing.
///
/// Payloads are snapshots taken at firing time (cheap via structural
/// sharing); later mutations of the underlying facts are not reflected.
#[derive(Clone, Debug)]
pub struct FiringRecord {
    /// Name of the rule that fired.
    pub rule_name: String,
    /// Wall-clock time of the firing.
    pub timestamp: DateTime<Utc>,
    /// Payloads of the facts the rule matched on.
    pub facts: Vec<Payload>,
    /// Payloads of the facts the action added during this firing.
    pub facts_added: Vec<Payload>,
}
