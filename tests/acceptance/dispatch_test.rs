//! Dispatch loop acceptance tests.
//!
//! Cover the three loop outcomes (schedule normally / poll / force-defer),
//! the force-defer boundary around the fault horizon, and termination of
//! the loop over a finite burst of ready timers.

use super::common::{board, board_with_step};
use mcu_common::error::FatalFault;
use mcu_common::tick::Tick;
use mcu_dispatch::dispatch::DispatchState;
use mcu_dispatch::hal::TimerQueue;

/// now=1000, next=2000, diff well above min_try - the loop
/// returns the waketime with no polling and no interrupt toggling.
#[test]
fn distant_timer_schedules_normally() {
    let mut b = board(1000);
    b.queue.schedule(Tick(2000), |_| {});

    let next = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();

    assert_eq!(next, Tick(2000));
    assert_eq!(b.dispatcher.state(), DispatchState::Dispatching);
    assert_eq!(b.gate.enable_count(), 0);
    assert_eq!(b.clock.peek(), Tick(1000));
}

/// now=1000, next=1001 - diff of exactly 1 is not strictly
/// greater than min_try, so the boundary falls into the poll branch.
#[test]
fn min_try_boundary_polls_instead_of_returning() {
    let mut b = board_with_step(1000, 1);
    let fired = b.queue.schedule_counted(Tick(1001));
    b.queue.schedule(Tick(900_000), |_| {});

    let next = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();

    // The imminent timer was polled for and fired in this same pass.
    assert_eq!(fired.get(), 1);
    assert_eq!(next, Tick(900_000));
    assert_eq!(b.dispatcher.state(), DispatchState::Polling);
    assert!(b.gate.enable_count() >= 1);
}

/// Guard already expired and next=now+1 - ForceDefer returns
/// now+DEFER_TICKS and re-opens the guard to now+REPEAT_WINDOW.
#[test]
fn expired_guard_forces_defer() {
    let mut b = board(1000);
    b.dispatcher.guard_mut().extend(Tick(0), 1); // long expired
    b.queue.schedule(Tick(1001), |_| {});

    let next = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();

    assert_eq!(next, Tick(1005));
    assert_eq!(b.dispatcher.state(), DispatchState::Deferred);
    assert_eq!(b.dispatcher.guard().deadline(), Tick(1100));
    // The deferred timer is untouched, still at the queue head.
    assert_eq!(b.queue.head_waketime(), Tick(1001));
}

/// ForceDefer boundary, benign side: a head within the 1000us horizon
/// yields a defer tick in (now, now+DEFER_TICKS] and a fresh window.
#[test]
fn force_defer_tolerates_head_inside_horizon() {
    let mut b = board(50_000);
    b.dispatcher.guard_mut().extend(Tick(0), 1);
    // Keeps rescheduling itself 1000 ticks in the past - exactly on the
    // horizon, which the strict is_before comparison still tolerates.
    b.queue.schedule_periodic(Tick(49_000), 0, |_| {});

    let next = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();

    let now = Tick(50_000);
    assert!(now.is_before(next));
    assert!(!next.is_before(now.offset(5)));
    assert_eq!(b.dispatcher.guard().deadline(), Tick(50_100));
}

/// ForceDefer boundary, fatal side: a head more than 1000us overdue is an
/// unrecoverable scheduling fault.
#[test]
fn force_defer_faults_past_horizon() {
    let mut b = board(50_000);
    b.dispatcher.guard_mut().extend(Tick(0), 1);
    b.queue.schedule_periodic(Tick(48_999), 0, |_| {});

    let err = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap_err();

    assert_eq!(
        err,
        FatalFault::RescheduledTimerInPast {
            next: Tick(48_999),
            now: Tick(50_000),
        }
    );
    let msg = err.to_string();
    assert!(msg.contains("rescheduled timer in the past"), "got: {msg}");
}

/// Termination: a finite burst of ready timers drains in one pass and the
/// loop returns the far-future head.
#[test]
fn finite_ready_burst_terminates() {
    let mut b = board_with_step(10_000, 1);
    let mut counts = Vec::new();
    for i in 0..20 {
        counts.push(b.queue.schedule_counted(Tick(9_000 + i * 10)));
    }
    b.queue.schedule(Tick(800_000), |_| {});

    let next = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();

    assert_eq!(next, Tick(800_000));
    assert!(counts.iter().all(|c| c.get() == 1));
}

/// Repeated interrupts across guard exhaustion: eager bursts alternate
/// with short deferred pauses and every timer still fires.
#[test]
fn defer_pause_resumes_dispatch() {
    let mut b = board_with_step(1000, 1);
    b.dispatcher.guard_mut().extend(Tick(0), 1);
    let fired = b.queue.schedule_counted(Tick(1001));
    b.queue.schedule(Tick(700_000), |_| {});

    // First interrupt: budget exhausted, timer deferred.
    let wake = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();
    assert_eq!(fired.get(), 0);

    // Hardware fires again at the deferred wake tick; the fresh window
    // granted by the defer lets the timer dispatch.
    b.clock.advance_to(wake);
    let next = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();

    assert_eq!(fired.get(), 1);
    assert_eq!(next, Tick(700_000));
}

/// Rollover: dispatch decisions are unaffected by the counter wrapping
/// between now and the queue head.
#[test]
fn dispatch_across_counter_rollover() {
    let mut b = board(0xFFFF_FF00);
    b.queue.schedule(Tick(0x0000_0100), |_| {});

    let next = b
        .dispatcher
        .run(&b.clock, &mut b.queue, &mut b.gate)
        .unwrap();

    assert_eq!(next, Tick(0x0000_0100));
    assert_eq!(b.dispatcher.state(), DispatchState::Dispatching);
}
