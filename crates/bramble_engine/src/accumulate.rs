//! Accumulator contracts: aggregation over a condition's matched fact set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bramble_foundation::{FactId, Value};
use bramble_memory::Fact;

/// Folds a full fact set into a single value.
pub type FoldFn = Arc<dyn Fn(&[Arc<Fact>]) -> Value>;

/// Produces the initial accumulator state.
pub type InitFn = Arc<dyn Fn() -> Value>;

/// Folds one fact into (or out of) the accumulator state.
pub type ReduceFn = Arc<dyn Fn(Value, &Fact) -> Value>;

/// Maps accumulator state to the exposed value.
pub type ConvertFn = Arc<dyn Fn(Value) -> Value>;

/// Decides whether an accumulated value produces a match.
pub type ValueTest = Arc<dyn Fn(&Value) -> bool>;

/// An aggregation over the facts matched by a child condition.
///
/// Two shapes exist. The batch form recomputes from the full fact set on
/// every evaluation. The incremental form keeps running state and folds
/// only the facts added since the last evaluation, retracting (or, without
/// a `retract` function, rebuilding from scratch) when facts disappear.
#[derive(Clone)]
pub enum Accumulate {
    /// Recompute from the full fact set each evaluation.
    Batch {
        /// Aggregation over the full fact set.
        fold: FoldFn,
        /// Gate on the aggregated value.
        test: ValueTest,
    },
    /// Maintain running state with reduce/retract deltas.
    Incremental {
        /// Produces the initial state.
        init: InitFn,
        /// Folds an added fact into the state.
        reduce: ReduceFn,
        /// Folds a removed fact out of the state. When absent, any removal
        /// rebuilds the state from `init` over the current fact set.
        retract: Option<ReduceFn>,
        /// Maps state to the exposed value (identity when absent).
        convert: Option<ConvertFn>,
        /// Gate on the exposed value.
        test: ValueTest,
    },
}

impl Accumulate {
    /// Creates a batch accumulator.
    pub fn batch(
        fold: impl Fn(&[Arc<Fact>]) -> Value + 'static,
        test: impl Fn(&Value) -> bool + 'static,
    ) -> Self {
        Self::Batch {
            fold: Arc::new(fold),
            test: Arc::new(test),
        }
    }

    /// Creates an incremental accumulator without retraction support.
    pub fn incremental(
        init: impl Fn() -> Value + 'static,
        reduce: impl Fn(Value, &Fact) -> Value + 'static,
        test: impl Fn(&Value) -> bool + 'static,
    ) -> Self {
        Self::Incremental {
            init: Arc::new(init),
            reduce: Arc::new(reduce),
            retract: None,
            convert: None,
            test: Arc::new(test),
        }
    }

    /// Adds a retract function. No effect on batch accumulators.
    #[must_use]
    pub fn with_retract(mut self, retract: impl Fn(Value, &Fact) -> Value + 'static) -> Self {
        if let Self::Incremental {
            retract: slot, ..
        } = &mut self
        {
            *slot = Some(Arc::new(retract));
        }
        self
    }

    /// Adds a state-to-value conversion. No effect on batch accumulators.
    #[must_use]
    pub fn with_convert(mut self, convert: impl Fn(Value) -> Value + 'static) -> Self {
        if let Self::Incremental {
            convert: slot, ..
        } = &mut self
        {
            *slot = Some(Arc::new(convert));
        }
        self
    }
}

impl fmt::Debug for Accumulate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch { .. } => write!(f, "Accumulate::Batch"),
            Self::Incremental { retract, convert, .. } => f
                .debug_struct("Accumulate::Incremental")
                .field("retract", &retract.is_some())
                .field("convert", &convert.is_some())
                .finish(),
        }
    }
}

/// Running state of an incremental accumulator.
///
/// State is held in a single top-level slot, not keyed by outer bindings;
/// accumulators are therefore only supported at positions whose parent
/// bindings are constant across evaluations.
#[derive(Debug, Default)]
pub(crate) struct AccumulatorState {
    /// Current folded state; `None` until first evaluation.
    pub state: Option<Value>,
    /// Facts already folded into the state, keyed by identity.
    pub seen: BTreeMap<FactId, Arc<Fact>>,
}
