//! Bramble - forward-chaining production-rule engine
//!
//! This crate re-exports all layers of the Bramble system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: bramble_aggregates — Aggregator library (count, sum, max, ...)
//! Layer 2: bramble_engine     — Condition DSL, node network, cycle loop
//! Layer 1: bramble_memory     — Typed working memory, recency, dirty types
//! Layer 0: bramble_foundation — Core types (Value, Payload, FactId, Error)
//! ```

pub use bramble_aggregates as aggregates;
pub use bramble_engine as engine;
pub use bramble_foundation as foundation;
pub use bramble_memory as memory;
