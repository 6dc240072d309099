use std::sync::Arc;
use std::time::Duration;

use tactics_core::ManualClock;
use tactics_sync::{ActivityGate, ActivityStats};

fn gate(clock: &Arc<ManualClock>) -> ActivityGate {
    ActivityGate::new(Duration::from_secs(60), clock.clone())
}

#[test]
fn first_contact_is_active() {
    let clock = Arc::new(ManualClock::new(0));
    let g = gate(&clock);
    assert!(g.is_active("villager-1"));
    assert_eq!(g.time_since_activity("villager-1"), Some(Duration::ZERO));
    assert_eq!(g.stats().tracked, 1);
}

#[test]
fn idle_subject_is_skipped_until_activity() {
    let clock = Arc::new(ManualClock::new(0));
    let g = gate(&clock);
    g.record_activity("zombie-7");
    clock.advance(Duration::from_secs(61));
    assert!(g.should_skip("zombie-7"));
    assert!(g.should_skip("zombie-7"));

    g.record_activity("zombie-7");
    assert!(!g.should_skip("zombie-7"));
    assert_eq!(g.stats().skipped, 2);
}

#[test]
fn threshold_boundary_is_exclusive() {
    let clock = Arc::new(ManualClock::new(0));
    let g = gate(&clock);
    g.record_activity("s");
    clock.advance(Duration::from_millis(59_999));
    assert!(g.is_active("s"));
    clock.advance(Duration::from_millis(1));
    assert!(!g.is_active("s"));
}

#[test]
fn remove_and_clear_forget_subjects() {
    let clock = Arc::new(ManualClock::new(0));
    let g = gate(&clock);
    g.record_activity("a");
    g.record_activity("b");
    g.remove("a");
    assert_eq!(g.time_since_activity("a"), None);

    clock.advance(Duration::from_secs(120));
    // Forgotten subjects start over as active.
    assert!(g.is_active("a"));
    assert!(!g.is_active("b"));
    assert!(g.should_skip("b"));
    g.clear();
    assert_eq!(g.stats(), ActivityStats::default());
}

#[test]
fn first_contact_is_active_even_with_zero_threshold() {
    let clock = Arc::new(ManualClock::new(5_000));
    let g = ActivityGate::new(Duration::ZERO, clock.clone());
    assert!(g.is_active("never-seen"));
    assert!(!g.should_skip("other-never-seen"));
    // Known subjects are idle immediately at a zero threshold.
    assert!(!g.is_active("never-seen"));
    assert_eq!(g.stats().skipped, 0);
}
