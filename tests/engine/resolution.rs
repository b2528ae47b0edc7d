//! Integration tests for conflict resolution and refraction.

use std::collections::HashSet;

use bramble_engine::{Condition, Engine, RuleDef, default_conflict_resolver};
use bramble_foundation::{Payload, Value};

fn tagging_rule(name: &str, salience: i32) -> RuleDef {
    let tag = name.to_string();
    RuleDef::new(
        name,
        Condition::fact("Person").bind("p"),
        move |_, ctx, _| {
            ctx.add_fact("Fired", Payload::new().with("rule", tag.as_str()))?;
            Ok(())
        },
    )
    .with_salience(salience)
}

fn firing_order(engine: &Engine) -> Vec<String> {
    engine
        .query(Some("Fired"))
        .execute()
        .iter()
        .map(|f| f.get("rule").and_then(Value::as_str).unwrap().to_string())
        .collect()
}

#[test]
fn salience_orders_firings() {
    let mut engine = Engine::new();
    engine.add_fact("Person", Payload::new()).unwrap();
    engine.add_rule(tagging_rule("low", 1)).unwrap();
    engine.add_rule(tagging_rule("high", 10)).unwrap();
    engine.add_rule(tagging_rule("mid", 5)).unwrap();

    engine.run().unwrap();

    assert_eq!(firing_order(&engine), vec!["high", "mid", "low"]);
}

#[test]
fn recency_breaks_salience_ties() {
    let mut engine = Engine::new();
    engine
        .add_fact("Person", Payload::new().with("name", "old"))
        .unwrap();
    engine
        .add_fact("Person", Payload::new().with("name", "new"))
        .unwrap();

    let def = RuleDef::new(
        "watch",
        Condition::fact("Person").bind("p"),
        |_, ctx, bindings| {
            let name = bindings.fact("p").unwrap().get("name").cloned().unwrap();
            ctx.add_fact("Fired", Payload::new().with("rule", name))?;
            Ok(())
        },
    );
    engine.add_rule(def).unwrap();

    engine.run().unwrap();

    assert_eq!(firing_order(&engine), vec!["new", "old"]);
}

#[test]
fn refraction_persists_across_runs() {
    let mut engine = Engine::new();
    let person = engine.add_fact("Person", Payload::new()).unwrap();
    engine.add_rule(tagging_rule("once", 0)).unwrap();

    engine.run().unwrap();
    engine.run().unwrap();
    assert_eq!(firing_order(&engine).len(), 1);

    // Mutating the fact re-dirties the type but keeps the id, so the
    // signature (and the refraction) is unchanged.
    engine
        .update_fact(person.id(), Payload::new().with("age", 1))
        .unwrap();
    engine.run().unwrap();
    assert_eq!(firing_order(&engine).len(), 1);

    // A different fact is a different scenario.
    engine.add_fact("Person", Payload::new()).unwrap();
    engine.run().unwrap();
    assert_eq!(firing_order(&engine).len(), 2);
}

#[test]
fn replacing_a_fact_changes_the_signature() {
    let mut engine = Engine::new();
    let person = engine.add_fact("Person", Payload::new()).unwrap();
    engine.add_rule(tagging_rule("watch", 0)).unwrap();

    engine.run().unwrap();
    assert_eq!(firing_order(&engine).len(), 1);

    // Remove and re-add: a new id means a new signature and a refire.
    engine.remove_fact(person.id()).unwrap();
    engine.add_fact("Person", Payload::new()).unwrap();
    engine.run().unwrap();
    assert_eq!(firing_order(&engine).len(), 2);
}

#[test]
fn engine_refracts_even_under_a_permissive_resolver() {
    let mut engine = Engine::new();
    engine.add_fact("Person", Payload::new()).unwrap();
    engine.add_rule(tagging_rule("noisy", 0)).unwrap();

    // A resolver that ignores the fired set entirely. Fired signatures are
    // still recorded by the engine, so a well-behaved resolver swapped in
    // later sees them.
    engine.set_conflict_resolver(|agenda, _| agenda);
    engine.run().unwrap();

    assert!(engine.fired_signatures().iter().any(|s| s.starts_with("noisy::")));

    engine.set_conflict_resolver(default_conflict_resolver);
    engine.run().unwrap();
    assert_eq!(firing_order(&engine).len(), 1);
}

#[test]
fn resolver_receives_the_raw_agenda() {
    let mut engine = Engine::new();
    engine.add_fact("Person", Payload::new()).unwrap();
    engine.add_rule(tagging_rule("a", 3)).unwrap();
    engine.add_rule(tagging_rule("b", 7)).unwrap();

    engine.set_conflict_resolver(|agenda, fired: &HashSet<String>| {
        // Raw agenda: both rules, unordered, pre-refraction.
        assert_eq!(agenda.len(), 2);
        default_conflict_resolver(agenda, fired)
    });

    engine.run().unwrap();
    assert_eq!(firing_order(&engine), vec!["b", "a"]);
}
