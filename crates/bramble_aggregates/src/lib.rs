//! Aggregators for Bramble accumulator conditions.
//!
//! Each function returns an [`Accumulate`] in one of the two contract
//! shapes: incremental (running state with reduce/retract) where a delta
//! is cheap to maintain, batch (full recompute) where it is not. Absent or
//! non-numeric attributes contribute zero to [`sum`] and [`average`] and
//! are skipped by [`max`] and [`min`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use bramble_engine::Accumulate;
use bramble_foundation::Value;

/// Counts the matched facts. Incremental, with retract.
pub fn count(test: impl Fn(&Value) -> bool + 'static) -> Accumulate {
    Accumulate::incremental(
        || Value::Int(0),
        |state, _| Value::Int(state.as_int().unwrap_or(0) + 1),
        test,
    )
    .with_retract(|state, _| Value::Int(state.as_int().unwrap_or(0) - 1))
}

/// Sums a numeric attribute across the matched facts. Incremental, with
/// retract; integer sums stay integers until a float contributes.
pub fn sum(attribute: impl Into<String>, test: impl Fn(&Value) -> bool + 'static) -> Accumulate {
    let attribute = attribute.into();
    let retract_attribute = attribute.clone();
    Accumulate::incremental(
        || Value::Int(0),
        move |state, fact| numeric_add(&state, fact.get(&attribute).unwrap_or(&Value::Int(0))),
        test,
    )
    .with_retract(move |state, fact| {
        numeric_sub(
            &state,
            fact.get(&retract_attribute).unwrap_or(&Value::Int(0)),
        )
    })
}

/// Tracks the maximum of an attribute. Incremental without retract: a
/// removal rebuilds the running maximum over the remaining facts.
pub fn max(attribute: impl Into<String>, test: impl Fn(&Value) -> bool + 'static) -> Accumulate {
    let attribute = attribute.into();
    Accumulate::incremental(
        || Value::Nil,
        move |state, fact| pick(state, fact.get(&attribute), |candidate, best| candidate > best),
        test,
    )
}

/// Tracks the minimum of an attribute. Incremental without retract, like
/// [`max`].
pub fn min(attribute: impl Into<String>, test: impl Fn(&Value) -> bool + 'static) -> Accumulate {
    let attribute = attribute.into();
    Accumulate::incremental(
        || Value::Nil,
        move |state, fact| pick(state, fact.get(&attribute), |candidate, best| candidate < best),
        test,
    )
}

/// Collects the matched facts themselves, as a vector of fact references.
/// Batch form.
pub fn collect_all(test: impl Fn(&Value) -> bool + 'static) -> Accumulate {
    Accumulate::batch(
        |facts| facts.iter().map(|f| Value::FactRef(f.id())).collect(),
        test,
    )
}

/// Averages a numeric attribute across the matched facts; `Nil` over the
/// empty set. Batch form.
pub fn average(
    attribute: impl Into<String>,
    test: impl Fn(&Value) -> bool + 'static,
) -> Accumulate {
    let attribute = attribute.into();
    Accumulate::batch(
        move |facts| {
            if facts.is_empty() {
                return Value::Nil;
            }
            let total: f64 = facts
                .iter()
                .filter_map(|f| f.get(&attribute).and_then(Value::as_number))
                .sum();
            #[allow(clippy::cast_precision_loss)]
            Value::Float(total / facts.len() as f64)
        },
        test,
    )
}

fn numeric_add(state: &Value, addend: &Value) -> Value {
    match (state, addend) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
        _ => Value::Float(state.as_number().unwrap_or(0.0) + addend.as_number().unwrap_or(0.0)),
    }
}

fn numeric_sub(state: &Value, subtrahend: &Value) -> Value {
    match (state, subtrahend) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a - b),
        _ => {
            Value::Float(state.as_number().unwrap_or(0.0) - subtrahend.as_number().unwrap_or(0.0))
        }
    }
}

/// Keeps the better of the running state and a candidate attribute value,
/// skipping absent or non-comparable candidates.
fn pick(state: Value, candidate: Option<&Value>, better: fn(&Value, &Value) -> bool) -> Value {
    match candidate {
        Some(candidate) if candidate.as_number().is_some() => {
            if state.is_nil() || better(candidate, &state) {
                candidate.clone()
            } else {
                state
            }
        }
        _ => state,
    }
}
