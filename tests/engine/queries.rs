//! Integration tests for the query builder, including use from actions.

use bramble_engine::{Condition, Engine, RuleDef};
use bramble_foundation::{Payload, Value};

fn seeded_engine() -> Engine {
    let mut engine = Engine::new();
    engine
        .add_fact("Person", Payload::new().with("name", "Alice").with("age", 30))
        .unwrap();
    engine
        .add_fact("Person", Payload::new().with("name", "Bob").with("age", 15))
        .unwrap();
    engine
        .add_fact("Person", Payload::new().with("name", "Carol").with("age", 41))
        .unwrap();
    engine
        .add_fact("Event", Payload::new().with("category", "Birthday"))
        .unwrap();
    engine
}

#[test]
fn typed_query_with_filter_and_limit() {
    let engine = seeded_engine();

    let adults = engine
        .query(Some("Person"))
        .filter(|f| f.get("age").and_then(Value::as_int).unwrap_or(0) >= 18)
        .limit(1)
        .execute();

    assert_eq!(adults.len(), 1);
    assert_eq!(adults[0].get("name"), Some(&Value::from("Alice")));
}

#[test]
fn untyped_query_spans_all_buckets() {
    let engine = seeded_engine();
    assert_eq!(engine.query(None).execute().len(), 4);
}

#[test]
fn actions_query_mid_cycle_state() {
    let mut engine = seeded_engine();

    engine
        .add_rule(RuleDef::new(
            "headcount",
            Condition::fact("Event").bind("e"),
            |_, ctx, _| {
                let people = ctx.query(Some("Person")).execute().len();
                ctx.add_fact(
                    "Headcount",
                    Payload::new().with("n", i64::try_from(people).unwrap_or(0)),
                )?;
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();

    let counts = engine.query(Some("Headcount")).execute();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].get("n"), Some(&Value::Int(3)));
}
