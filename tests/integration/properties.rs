//! Property tests over the full engine.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use bramble_engine::{Condition, ConditionCompiler, Engine, RuleDef};
use bramble_foundation::Payload;
use bramble_memory::WorkingMemory;

proptest! {
    /// A variable shared across two join branches only ever unifies with
    /// itself: the join of a bucket against itself under one variable is
    /// exactly the diagonal.
    #[test]
    fn shared_variable_join_is_diagonal(count in 0usize..12) {
        let mut wm = WorkingMemory::new();
        for i in 0..count {
            wm.insert("Node", Payload::new().with("i", i64::try_from(i).unwrap())).unwrap();
        }

        let condition = Condition::all(vec![
            Condition::fact("Node").bind("x"),
            Condition::fact("Node").bind("x"),
        ]);
        let mut network = ConditionCompiler::compile(&condition).unwrap();
        let matches = network.root.evaluate(&wm);

        prop_assert_eq!(matches.len(), count);
        for m in matches {
            let bound = m.bindings.fact("x").unwrap();
            prop_assert!(m.facts.iter().all(|f| f.id() == bound.id()));
        }
    }

    /// Each (rule, fact) scenario fires exactly once across any number of
    /// runs, however the fact set was built up.
    #[test]
    fn refraction_is_exactly_once_per_fact(
        batches in proptest::collection::vec(1usize..4, 1..5)
    ) {
        let mut engine = Engine::new();
        let firings = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&firings);
        engine
            .add_rule(RuleDef::new(
                "tally",
                Condition::fact("Item").bind("item"),
                move |_, _, _| {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                },
            ))
            .unwrap();

        let mut total = 0;
        for batch in batches {
            for _ in 0..batch {
                engine.add_fact("Item", Payload::new()).unwrap();
            }
            total += batch;
            // Run twice per batch: the second pass must add nothing.
            engine.run().unwrap();
            engine.run().unwrap();
            prop_assert_eq!(*firings.lock().unwrap(), total);
        }
    }
}
