//! Integration tests for the condition DSL compiled end-to-end.

use bramble_engine::{Condition, Engine, RuleDef};
use bramble_foundation::{ErrorKind, Payload, Value};

fn payload(pairs: &[(&str, Value)]) -> Payload {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

#[test]
fn alpha_test_filters_per_fact() {
    let mut engine = Engine::new();
    engine
        .add_fact("Reading", payload(&[("celsius", Value::Int(10))]))
        .unwrap();
    engine
        .add_fact("Reading", payload(&[("celsius", Value::Int(80))]))
        .unwrap();
    engine
        .add_rule(RuleDef::new(
            "overheat",
            Condition::fact("Reading")
                .with_test(|f| f.get("celsius").and_then(Value::as_int).unwrap_or(0) > 50)
                .bind("r"),
            |facts, ctx, _| {
                let celsius = facts[0].get("celsius").cloned().unwrap();
                ctx.add_fact("Alarm", Payload::new().with("celsius", celsius))?;
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();

    let alarms = engine.query(Some("Alarm")).execute();
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].get("celsius"), Some(&Value::Int(80)));
}

#[test]
fn join_test_reads_bindings() {
    let mut engine = Engine::new();
    engine
        .add_fact(
            "Person",
            payload(&[("name", Value::from("Ada")), ("city", Value::from("Oslo"))]),
        )
        .unwrap();
    engine
        .add_fact(
            "Person",
            payload(&[("name", Value::from("Bo")), ("city", Value::from("Bergen"))]),
        )
        .unwrap();
    engine
        .add_fact("Office", payload(&[("city", Value::from("Oslo"))]))
        .unwrap();

    engine
        .add_rule(RuleDef::new(
            "commuter",
            Condition::all(vec![
                Condition::fact("Person").bind("p"),
                Condition::fact("Office").bind("o"),
                Condition::join(|_, b| {
                    b.fact("p").and_then(|p| p.get("city")) == b.fact("o").and_then(|o| o.get("city"))
                }),
            ]),
            |_, ctx, bindings| {
                let name = bindings.fact("p").unwrap().get("name").cloned().unwrap();
                ctx.add_fact("Commuter", Payload::new().with("name", name))?;
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();

    let commuters = engine.query(Some("Commuter")).execute();
    assert_eq!(commuters.len(), 1);
    assert_eq!(commuters[0].get("name"), Some(&Value::from("Ada")));
}

#[test]
fn exists_fires_once_regardless_of_count() {
    let mut engine = Engine::new();
    engine.add_fact("Error", Payload::new()).unwrap();
    engine.add_fact("Error", Payload::new()).unwrap();
    engine.add_fact("Error", Payload::new()).unwrap();

    engine
        .add_rule(RuleDef::new(
            "any-errors",
            Condition::exists(Condition::fact("Error")),
            |_, ctx, _| {
                ctx.add_fact("Flag", Payload::new())?;
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();
    assert_eq!(engine.query(Some("Flag")).execute().len(), 1);
}

#[test]
fn negated_rule_reacts_to_absence() {
    let mut engine = Engine::new();
    engine
        .add_fact("Heartbeat", payload(&[("node", Value::from("a"))]))
        .unwrap();

    engine
        .add_rule(RuleDef::new(
            "dead-air",
            Condition::not(Condition::fact("Heartbeat")),
            |_, ctx, _| {
                ctx.add_fact("Silence", Payload::new())?;
                Ok(())
            },
        ))
        .unwrap();

    // Present: the negation blocks.
    engine.run().unwrap();
    assert!(engine.query(Some("Silence")).execute().is_empty());

    // Retract the heartbeat: the negation now matches, even though no
    // referenced type would pass a dirty check on its own.
    let beat = engine.query(Some("Heartbeat")).execute()[0].id();
    engine.remove_fact(beat).unwrap();
    engine.run().unwrap();
    assert_eq!(engine.query(Some("Silence")).execute().len(), 1);
}

#[test]
fn invalid_shapes_are_rejected_at_add_rule() {
    let mut engine = Engine::new();

    let mut mixed = Condition::fact("Person");
    mixed.any = Some(vec![Condition::fact("Event")]);

    let err = engine
        .add_rule(RuleDef::new("mixed", mixed, |_, _, _| Ok(())))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDsl(_)));
    assert_eq!(err.rule.as_deref(), Some("mixed"));
}

#[test]
fn nested_composites_compile_and_match() {
    let mut engine = Engine::new();
    engine
        .add_fact("Sensor", payload(&[("kind", Value::from("smoke"))]))
        .unwrap();
    engine
        .add_fact("Zone", payload(&[("armed", Value::Bool(true))]))
        .unwrap();

    engine
        .add_rule(RuleDef::new(
            "alarm",
            Condition::all(vec![
                Condition::fact("Zone")
                    .with_test(|f| f.get("armed").and_then(Value::as_bool).unwrap_or(false))
                    .bind("z"),
                Condition::any(vec![
                    Condition::fact("Sensor")
                        .with_test(|f| f.get("kind").and_then(Value::as_str) == Some("smoke")),
                    Condition::fact("Sensor")
                        .with_test(|f| f.get("kind").and_then(Value::as_str) == Some("heat")),
                ]),
                Condition::not(Condition::fact("Override")),
            ]),
            |_, ctx, _| {
                ctx.add_fact("Alarm", Payload::new())?;
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();
    assert_eq!(engine.query(Some("Alarm")).execute().len(), 1);
}
