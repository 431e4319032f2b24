//! Driver loop: gating policies, per-day checkpointing, resume.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use replay_core::account::Account;
use replay_core::calendar::SliceCalendar;
use replay_core::checkpoint::{CheckpointStore, DirCheckpointStore};
use replay_core::clock::Clock;
use replay_core::domain::{PriceRecord, SecurityId};
use replay_core::feed::MemoryFeed;
use replay_runner::driver::{
    resume_or_init, run_session, CutoffPolicy, StopReason, WallClock,
};
use std::cell::RefCell;
use std::time::Duration;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(16, 30, 0).unwrap()
}

/// Scripted wall clock: `sleep` advances virtual time and records the call.
struct MockWallClock {
    now: RefCell<NaiveDateTime>,
    sleeps: RefCell<Vec<Duration>>,
}

impl MockWallClock {
    fn starting_at(now: NaiveDateTime) -> Self {
        Self {
            now: RefCell::new(now),
            sleeps: RefCell::new(Vec::new()),
        }
    }
}

impl WallClock for MockWallClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.borrow()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        *self.now.borrow_mut() += chrono::Duration::from_std(duration).unwrap();
    }
}

fn two_day_clock() -> (Clock, SliceCalendar) {
    let mut feed = MemoryFeed::new("quotes", 1);
    feed.push(PriceRecord::full(d("2024-01-02"), SecurityId(0), 10.0, 10.0, 0.01, 9.9, 9.9));
    feed.push(PriceRecord::full(d("2024-01-03"), SecurityId(0), 10.2, 10.2, 0.02, 10.0, 10.0));
    let mut clock = Clock::new(d("2024-01-01"));
    clock.add_feed(Box::new(feed));
    clock.add_account(Account::new("a1", 1_000_000.0, 0.0005));
    let calendar = SliceCalendar::new(vec![d("2024-01-02"), d("2024-01-03")]);
    (clock, calendar)
}

#[test]
fn abort_policy_stops_without_running_the_day() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirCheckpointStore::new(dir.path());
    let (mut clock, calendar) = two_day_clock();
    let wall = MockWallClock::starting_at(dt("2024-01-02 10:00"));

    let report = run_session(
        &mut clock,
        &calendar,
        &store,
        CutoffPolicy::AbortIfBeforeCutoff,
        cutoff(),
        &wall,
    )
    .unwrap();

    assert_eq!(report.days_run, 0);
    assert_eq!(report.stop_reason, StopReason::CutoffNotReached);
    assert!(wall.sleeps.borrow().is_empty());
    // No phases ran, nothing persisted.
    assert!(clock.benchmark_history().is_empty());
    assert!(store.list_committed_keys().unwrap().is_empty());
}

#[test]
fn wait_policy_polls_until_the_gate_opens() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirCheckpointStore::new(dir.path());
    let (mut clock, calendar) = two_day_clock();
    let wall = MockWallClock::starting_at(dt("2024-01-02 16:00"));

    let report = run_session(
        &mut clock,
        &calendar,
        &store,
        CutoffPolicy::WaitUntilCutoff,
        cutoff(),
        &wall,
    )
    .unwrap();

    assert_eq!(report.days_run, 2);
    assert_eq!(report.stop_reason, StopReason::CalendarExhausted);
    // Polled through the first gate (30 min) and the overnight gap.
    assert!(!wall.sleeps.borrow().is_empty());
    assert!(wall.now() >= dt("2024-01-03 16:30"));
    assert_eq!(clock.benchmark_history().len(), 2);
}

#[test]
fn completed_days_are_checkpointed_and_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirCheckpointStore::new(dir.path());
    let (mut clock, calendar) = two_day_clock();
    // Far enough in the future that every gate is already open.
    let wall = MockWallClock::starting_at(dt("2030-01-01 00:00"));

    let report = run_session(
        &mut clock,
        &calendar,
        &store,
        CutoffPolicy::AbortIfBeforeCutoff,
        cutoff(),
        &wall,
    )
    .unwrap();
    assert_eq!(report.days_run, 2);

    // Only the newest checkpoint survives pruning.
    assert_eq!(store.list_committed_keys().unwrap(), vec![d("2024-01-03")]);
}

#[test]
fn resume_restores_the_last_committed_day() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirCheckpointStore::new(dir.path());
    {
        let (mut clock, calendar) = two_day_clock();
        let wall = MockWallClock::starting_at(dt("2030-01-01 00:00"));
        run_session(
            &mut clock,
            &calendar,
            &store,
            CutoffPolicy::AbortIfBeforeCutoff,
            cutoff(),
            &wall,
        )
        .unwrap();
    }

    // A fresh process: init builds day-zero state, recovery overwrites it.
    let clock = resume_or_init(&store, || two_day_clock().0).unwrap();
    assert_eq!(clock.current_date(), d("2024-01-03"));
    assert_eq!(clock.benchmark_history().len(), 2);

    // The exhausted calendar ends the resumed session immediately.
    let mut clock = clock;
    let calendar = two_day_clock().1;
    let wall = MockWallClock::starting_at(dt("2030-01-01 00:00"));
    let report = run_session(
        &mut clock,
        &calendar,
        &store,
        CutoffPolicy::AbortIfBeforeCutoff,
        cutoff(),
        &wall,
    )
    .unwrap();
    assert_eq!(report.days_run, 0);
    assert_eq!(report.stop_reason, StopReason::CalendarExhausted);
}

#[test]
fn fresh_store_keeps_initial_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirCheckpointStore::new(dir.path().join("empty"));
    let clock = resume_or_init(&store, || two_day_clock().0).unwrap();
    assert_eq!(clock.current_date(), d("2024-01-01"));
}
