//! End-to-end scenarios driving the full match-resolve-act cycle.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use bramble_aggregates::sum;
use bramble_engine::{
    AgendaEntry, Condition, Engine, RuleDef, default_conflict_resolver,
};
use bramble_foundation::{Payload, Value};

fn age_at_least(threshold: i64) -> impl Fn(&bramble_memory::Fact) -> bool {
    move |f| f.get("age").and_then(Value::as_int).unwrap_or(0) >= threshold
}

/// Adult birthday: a two-fact join with a beta test over the bindings.
#[test]
fn adult_birthday_join() {
    let mut engine = Engine::new();
    engine
        .add_fact("Person", Payload::new().with("name", "Alice").with("age", 30))
        .unwrap();
    engine
        .add_fact(
            "Event",
            Payload::new()
                .with("category", "Birthday")
                .with("personName", "Alice"),
        )
        .unwrap();

    let fired: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&fired);

    engine
        .add_rule(RuleDef::new(
            "adult-birthday",
            Condition::all(vec![
                Condition::fact("Person").with_test(age_at_least(18)).bind("p"),
                Condition::fact("Event")
                    .with_test(|f| f.get("category").and_then(Value::as_str) == Some("Birthday"))
                    .bind("e"),
                Condition::join(|_, b| {
                    b.fact("e").and_then(|e| e.get("personName"))
                        == b.fact("p").and_then(|p| p.get("name"))
                }),
            ]),
            move |_, _, bindings| {
                let person = bindings.fact("p").unwrap();
                let event = bindings.fact("e").unwrap();
                log.lock().unwrap().push((
                    person.get("name").and_then(Value::as_str).unwrap().to_string(),
                    event.get("category").and_then(Value::as_str).unwrap().to_string(),
                ));
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();

    let fired = fired.lock().unwrap();
    assert_eq!(
        fired.as_slice(),
        &[("Alice".to_string(), "Birthday".to_string())]
    );
}

/// Disjunction: one firing per matching branch fact, refracted thereafter.
#[test]
fn any_fires_per_matching_fact() {
    let mut engine = Engine::new();
    engine
        .add_fact("Animal", Payload::new().with("species", "cat"))
        .unwrap();
    engine
        .add_fact("Animal", Payload::new().with("species", "dog"))
        .unwrap();

    let species_test = |wanted: &'static str| {
        Condition::fact("Animal")
            .with_test(move |f| f.get("species").and_then(Value::as_str) == Some(wanted))
    };

    engine
        .add_rule(RuleDef::new(
            "known-species",
            Condition::any(vec![
                species_test("cat"),
                species_test("horse"),
                species_test("dog"),
            ]),
            |facts, ctx, _| {
                let species = facts[0].get("species").cloned().unwrap();
                ctx.add_fact("Sighting", Payload::new().with("species", species))?;
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();
    assert_eq!(engine.query(Some("Sighting")).execute().len(), 2);

    // Refracted: nothing new on a second run.
    engine.run().unwrap();
    assert_eq!(engine.query(Some("Sighting")).execute().len(), 2);
}

/// Negation under `any`: the `not` branch fails (an Expired fact exists),
/// the plain branch matches once.
#[test]
fn negation_branch_with_existing_fact() {
    let mut engine = Engine::new();
    engine
        .add_fact("Entity", Payload::new().with("status", "Expired"))
        .unwrap();
    engine
        .add_fact("Entity", Payload::new().with("status", "Active"))
        .unwrap();

    engine
        .add_rule(RuleDef::new(
            "active-or-none-expired",
            Condition::any(vec![
                Condition::not(
                    Condition::fact("Entity")
                        .with_test(|f| f.get("status").and_then(Value::as_str) == Some("Expired")),
                ),
                Condition::fact("Entity")
                    .with_test(|f| f.get("status").and_then(Value::as_str) == Some("Active")),
            ]),
            |_, ctx, _| {
                ctx.add_fact("Hit", Payload::new())?;
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();
    assert_eq!(engine.query(Some("Hit")).execute().len(), 1);
}

/// Incremental sum across chained firings: the doubling rule runs at
/// higher salience, the sum sees each cycle's fact set in turn.
#[test]
fn incremental_sum_across_chaining() {
    let mut engine = Engine::new();
    engine
        .add_fact("Product", Payload::new().with("price", 10))
        .unwrap();
    engine
        .add_fact("Product", Payload::new().with("price", 20))
        .unwrap();

    let doubled = Arc::new(Mutex::new(0usize));
    let doubled_count = Arc::clone(&doubled);
    engine
        .add_rule(
            RuleDef::new(
                "double-unprocessed",
                Condition::fact("Product")
                    .with_test(|f| f.get("processed").is_none())
                    .bind("product"),
                move |facts, ctx, _| {
                    let price = facts[0].get("price").and_then(Value::as_int).unwrap_or(0);
                    ctx.add_fact(
                        "Product",
                        Payload::new().with("price", price * 2).with("processed", true),
                    )?;
                    *doubled_count.lock().unwrap() += 1;
                    Ok(())
                },
            )
            .with_salience(10),
        )
        .unwrap();

    let totals = Arc::new(Mutex::new(Vec::new()));
    let totals_log = Arc::clone(&totals);
    engine
        .add_rule(RuleDef::new(
            "running-total",
            Condition::fact("Product")
                .with_accumulate(sum("price", |_| true))
                .bind("total"),
            move |_, _, bindings| {
                totals_log
                    .lock()
                    .unwrap()
                    .push(bindings.value("total").cloned().unwrap());
                Ok(())
            },
        ))
        .unwrap();

    engine.run().unwrap();

    assert_eq!(*doubled.lock().unwrap(), 2);
    assert_eq!(
        totals.lock().unwrap().as_slice(),
        &[Value::Int(30), Value::Int(90)]
    );
}

/// Recency tie-break: two equal-salience rules over the same facts; the
/// most recently touched fact sorts first, signatures order rules within
/// each pair.
#[test]
fn default_resolver_recency_tie_break() {
    let mut engine = Engine::new();
    let adult = || Condition::fact("Person").with_test(age_at_least(18)).bind("p");

    engine.add_rule(RuleDef::new("ruleA", adult(), |_, _, _| Ok(()))).unwrap();
    engine.add_rule(RuleDef::new("ruleB", adult(), |_, _, _| Ok(()))).unwrap();

    engine
        .add_fact("Person", Payload::new().with("name", "Alice").with("age", 20))
        .unwrap();
    let bob = engine
        .add_fact("Person", Payload::new().with("name", "Bob").with("age", 22))
        .unwrap();
    engine
        .update_fact(bob.id(), Payload::new().with("age", 23))
        .unwrap();

    // Capture what the resolver sees and returns, then keep it from firing
    // so the agenda can be inspected in isolation.
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    engine.set_conflict_resolver(move |agenda: Vec<AgendaEntry>, fired: &HashSet<String>| {
        let resolved = default_conflict_resolver(agenda, fired);
        *sink.lock().unwrap() = resolved
            .iter()
            .map(|e| e.signature.clone())
            .collect::<Vec<_>>();
        Vec::new()
    });

    engine.run().unwrap();

    let order = observed.lock().unwrap();
    assert_eq!(
        order.as_slice(),
        &["ruleA::2", "ruleB::2", "ruleA::1", "ruleB::1"]
    );
}
