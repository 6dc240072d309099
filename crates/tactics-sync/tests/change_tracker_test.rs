use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tactics_core::ManualClock;
use tactics_sync::ChangeTracker;

fn tracker(clock: &Arc<ManualClock>) -> ChangeTracker {
    ChangeTracker::new("persist", clock.clone())
}

#[test]
fn dirty_then_clean() {
    let clock = Arc::new(ManualClock::new(1_000));
    let t = tracker(&clock);
    assert!(!t.has_any_dirty());

    t.mark_dirty("zombie");
    t.mark_dirty_sub("skeleton", "action_3");
    t.mark_dirty_sub("skeleton", "action_1");
    assert!(t.is_dirty("zombie"));
    assert_eq!(t.dirty_subjects(), vec!["skeleton", "zombie"]);
    let subs: Vec<_> = t.dirty_sub_keys("skeleton").into_iter().collect();
    assert_eq!(subs, vec!["action_1", "action_3"]);

    t.mark_clean("skeleton");
    assert!(!t.is_dirty("skeleton"));
    assert!(t.dirty_sub_keys("skeleton").is_empty());
    assert!(t.has_any_dirty());
    t.mark_clean("zombie");
    assert!(!t.has_any_dirty());
}

#[test]
fn time_since_last_save_is_infinite_until_cleaned() {
    let clock = Arc::new(ManualClock::new(0));
    let t = tracker(&clock);
    assert_eq!(t.time_since_last_save("creeper"), Duration::MAX);
    t.mark_dirty("creeper");
    assert_eq!(t.time_since_last_save("creeper"), Duration::MAX);

    t.mark_clean("creeper");
    clock.advance(Duration::from_millis(2_500));
    assert_eq!(t.time_since_last_save("creeper"), Duration::from_millis(2_500));
}

#[test]
fn change_during_flush_survives_the_clean() {
    let clock = Arc::new(ManualClock::new(0));
    let t = tracker(&clock);
    t.mark_dirty_sub("zombie", "a");
    t.mark_dirty("spider");
    let tokens = t.checkpoint();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].subject, "spider");

    // Arrives while the flush is doing I/O.
    t.mark_dirty_sub("zombie", "b");

    let cleaned: Vec<bool> = tokens.iter().map(|tok| t.mark_clean_if_unchanged(tok)).collect();
    assert_eq!(cleaned, vec![true, false]);
    assert!(!t.is_dirty("spider"));
    assert!(t.is_dirty("zombie"));
    let remaining: Vec<_> = t.dirty_sub_keys("zombie").into_iter().collect();
    assert_eq!(remaining, vec!["b"]);
}

#[test]
fn clear_all_forgets_everything() {
    let clock = Arc::new(ManualClock::new(0));
    let t = tracker(&clock);
    t.mark_dirty("a");
    t.mark_clean("b");
    t.clear_all();
    assert!(!t.has_any_dirty());
    assert_eq!(t.time_since_last_save("b"), Duration::MAX);
    assert_eq!(t.stats().tracked, 0);
}

#[test]
fn stats_count_marks_and_cleans() {
    let clock = Arc::new(ManualClock::new(0));
    let t = tracker(&clock);
    t.mark_dirty("a");
    t.mark_dirty_sub("b", "x");
    t.mark_dirty_sub("b", "y");
    t.mark_clean("a");
    let stats = t.stats();
    assert_eq!(stats.tracked, 2);
    assert_eq!(stats.dirty, 1);
    assert_eq!(stats.dirty_sub_keys, 2);
    assert_eq!(stats.marks, 3);
    assert_eq!(stats.cleans, 1);
}

#[test]
fn concurrent_marks_are_not_lost() {
    let clock = Arc::new(ManualClock::new(0));
    let t = Arc::new(tracker(&clock));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let t = t.clone();
            std::thread::spawn(move || {
                for j in 0..100 {
                    t.mark_dirty_sub(&format!("subject_{}", i % 4), &format!("k{j}"));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(t.dirty_subjects().len(), 4);
    assert_eq!(t.stats().marks, 800);
    assert_eq!(t.dirty_sub_keys("subject_0").len(), 100);
}

#[derive(Debug, Clone)]
enum Op {
    Dirty(u8),
    Clean(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![(0u8..5).prop_map(Op::Dirty), (0u8..5).prop_map(Op::Clean)]
}

proptest! {
    #[test]
    fn has_any_dirty_matches_model(ops in prop::collection::vec(op(), 0..60)) {
        let clock = Arc::new(ManualClock::new(0));
        let t = tracker(&clock);
        let mut model: HashSet<u8> = HashSet::new();
        for op in ops {
            match op {
                Op::Dirty(k) => {
                    t.mark_dirty(&k.to_string());
                    model.insert(k);
                }
                Op::Clean(k) => {
                    t.mark_clean(&k.to_string());
                    model.remove(&k);
                }
            }
            prop_assert_eq!(t.has_any_dirty(), !model.is_empty());
        }
        prop_assert_eq!(t.dirty_subjects().len(), model.len());
    }
}
