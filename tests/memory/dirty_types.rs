//! Integration tests for dirty-type bookkeeping across cycles.

use bramble_foundation::Payload;
use bramble_memory::WorkingMemory;

#[test]
fn mutations_mark_the_next_cycle() {
    let mut wm = WorkingMemory::new();
    let fact = wm.insert("Person", Payload::new()).unwrap();

    assert!(wm.is_type_dirty("Person"));
    assert!(wm.dirty_current_types().is_empty());

    wm.promote_next_dirty();
    assert_eq!(wm.dirty_current_types().len(), 1);

    // Mid-cycle mutations accumulate for the next promotion.
    wm.clear_current_dirty();
    wm.update(fact.id(), Payload::new().with("age", 1)).unwrap();
    assert!(wm.dirty_current_types().is_empty());
    assert!(wm.is_type_dirty("Person"));
}

#[test]
fn remove_marks_type_dirty() {
    let mut wm = WorkingMemory::new();
    let fact = wm.insert("Person", Payload::new()).unwrap();
    wm.promote_next_dirty();
    wm.clear_current_dirty();

    wm.remove(fact.id()).unwrap();
    assert!(wm.is_type_dirty("Person"));
}

#[test]
fn clear_only_drops_current() {
    let mut wm = WorkingMemory::new();
    wm.insert("A", Payload::new()).unwrap();
    wm.promote_next_dirty();
    wm.insert("B", Payload::new()).unwrap();

    wm.clear_current_dirty();
    // A was current and is gone; B is still pending.
    assert!(!wm.is_type_dirty("A"));
    assert!(wm.is_type_dirty("B"));

    wm.promote_next_dirty();
    assert!(wm.dirty_current_types().contains("B"));
}
