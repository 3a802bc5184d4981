//! Idle booster and shutdown hook acceptance tests.

use super::common::board;
use mcu_common::metrics::SleepMetrics;
use mcu_common::tick::Tick;
use mcu_dispatch::idle::{Boost, IdleBooster};

#[test]
fn changed_head_never_sleeps() {
    let mut b = board(1000);
    let mut booster = IdleBooster::new();
    let mut stats = SleepMetrics::new();

    b.queue.schedule(Tick(400_000), |_| {});
    let first = booster.run_once(&mut b.dispatcher, &b.clock, &b.queue, &mut b.gate, &mut stats);
    assert_eq!(first, Boost::Extended);

    // Head moves again before the next pass: still no sleep.
    b.queue.schedule(Tick(300_000), |_| {});
    let second = booster.run_once(&mut b.dispatcher, &b.clock, &b.queue, &mut b.gate, &mut stats);
    assert_eq!(second, Boost::Extended);

    assert_eq!(b.gate.sleep_count(), 0);
    assert_eq!(stats.sleep_count(), 0);
}

#[test]
fn unchanged_head_sleeps_exactly_once_per_pass() {
    let mut b = board(1000);
    let mut booster = IdleBooster::new();
    let mut stats = SleepMetrics::new();
    b.queue.schedule(Tick(400_000), |_| {});

    // Pass 1 caches the head; pass 2 finds it unchanged and sleeps.
    booster.run_once(&mut b.dispatcher, &b.clock, &b.queue, &mut b.gate, &mut stats);
    let outcome = booster.run_once(&mut b.dispatcher, &b.clock, &b.queue, &mut b.gate, &mut stats);

    // The simulated gate wakes 500 ticks later.
    assert_eq!(outcome, Boost::Slept(500));
    assert_eq!(b.gate.sleep_count(), 1);
    assert_eq!(stats.sleep_count(), 1);
    assert_eq!(stats.total_ticks(), 500);
}

#[test]
fn idle_sleep_widens_guard_from_wake_time() {
    let mut b = board(1000);
    let mut booster = IdleBooster::new();
    let mut stats = SleepMetrics::new();
    b.queue.schedule(Tick(400_000), |_| {});

    booster.run_once(&mut b.dispatcher, &b.clock, &b.queue, &mut b.gate, &mut stats);
    booster.run_once(&mut b.dispatcher, &b.clock, &b.queue, &mut b.gate, &mut stats);

    // Slept from 1000 to 1500; guard re-anchored at the post-sleep clock
    // plus the idle window of 500.
    assert_eq!(b.dispatcher.guard().deadline(), Tick(2000));
}

#[test]
fn shutdown_hook_discards_eager_budget() {
    let mut b = board(1000);

    // Mid-burst state: a forced defer granted a narrow window.
    b.dispatcher.guard_mut().extend(Tick(1000), 100);
    assert!(b.dispatcher.guard().expired(Tick(5000)));

    b.dispatcher.reset(Tick(5000));

    // Clean restart state: idle-width window from the reset tick.
    assert_eq!(b.dispatcher.guard().deadline(), Tick(5500));
    assert!(!b.dispatcher.guard().expired(Tick(5500)));
}

#[test]
fn booster_keeps_dispatch_alive_through_idle_period() {
    // End-to-end: an idle stretch (booster sleeps) followed by the timer
    // becoming due and dispatching normally.
    let mut b = board(1000);
    let mut booster = IdleBooster::new();
    let mut stats = SleepMetrics::new();
    let fired = b.queue.schedule_counted(Tick(3000));

    // Idle until the sleep quantum walks the clock past the waketime.
    for _ in 0..10 {
        booster.run_once(&mut b.dispatcher, &b.clock, &b.queue, &mut b.gate, &mut stats);
        if !b.clock.peek().is_before(Tick(3000)) {
            break;
        }
    }
    assert!(b.gate.sleep_count() >= 1);

    let next = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();
    assert_eq!(fired.get(), 1);
    // Queue is empty afterwards; the head parks one horizon out.
    assert_eq!(next, b.clock.peek().offset(super::common::SIM_FREQ_HZ));
}
