//! Session driver: advances the clock day by day behind a real-time gate.
//!
//! The gate models a daily settlement cutoff — data for a trading date is
//! only trustworthy once the wall clock has passed that date's cutoff time.
//! Two gating policies are exposed because live and catch-up sessions want
//! different behavior:
//! - `AbortIfBeforeCutoff` stops the session the moment it reaches a date
//!   whose cutoff has not passed (a catch-up replay that ran out of history);
//! - `WaitUntilCutoff` polls until the cutoff passes, then runs the day
//!   (a long-lived daily session).
//!
//! Gating is a driver concern; the clock's own state machine knows nothing
//! about wall time.

use anyhow::Result;
use chrono::{NaiveDateTime, NaiveTime};
use replay_core::calendar::TradingCalendar;
use replay_core::checkpoint::{CheckpointStore, DirCheckpointStore};
use replay_core::clock::Clock;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to sleep between cutoff polls under `WaitUntilCutoff`.
pub const POLL_INTERVAL: Duration = Duration::from_secs(300);

/// What to do when a day's settlement cutoff has not passed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffPolicy {
    WaitUntilCutoff,
    AbortIfBeforeCutoff,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The calendar has no further trading date — normal termination.
    CalendarExhausted,
    /// `AbortIfBeforeCutoff` hit a date whose cutoff is still in the future.
    CutoffNotReached,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionReport {
    pub days_run: usize,
    pub stop_reason: StopReason,
}

/// Wall-time seam so the gate is testable without sleeping.
pub trait WallClock {
    fn now(&self) -> NaiveDateTime;
    fn sleep(&self, duration: Duration);
}

pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Run trading days until the calendar is exhausted or the gate aborts.
///
/// Each completed day is checkpointed and older checkpoints are pruned, so a
/// crash resumes from the last finished date via [`resume_or_init`].
pub fn run_session(
    clock: &mut Clock,
    calendar: &dyn TradingCalendar,
    store: &DirCheckpointStore,
    policy: CutoffPolicy,
    cutoff: NaiveTime,
    wall: &dyn WallClock,
) -> Result<SessionReport> {
    let mut days_run = 0;
    loop {
        if !clock.advance(calendar)? {
            return Ok(SessionReport {
                days_run,
                stop_reason: StopReason::CalendarExhausted,
            });
        }

        let gate_opens = clock.current_date().and_time(cutoff);
        match policy {
            CutoffPolicy::AbortIfBeforeCutoff => {
                if wall.now() < gate_opens {
                    return Ok(SessionReport {
                        days_run,
                        stop_reason: StopReason::CutoffNotReached,
                    });
                }
            }
            CutoffPolicy::WaitUntilCutoff => {
                while wall.now() < gate_opens {
                    wall.sleep(POLL_INTERVAL);
                }
            }
        }

        clock.before_open();
        clock.open();
        clock.close();
        clock.after_close()?;

        let date = clock.current_date();
        store.write_snapshot(date, &clock.snapshot())?;
        store.prune_before(date)?;
        days_run += 1;
    }
}

/// Build the clock via `init`, then overwrite its state from the newest
/// committed checkpoint if one exists. `init` registers feeds, hooks, and
/// fresh accounts either way.
pub fn resume_or_init(
    store: &DirCheckpointStore,
    init: impl FnOnce() -> Clock,
) -> Result<Clock> {
    let mut clock = init();
    if let Some((date, graph)) = store.recover_latest()? {
        clock.restore(graph);
        clock.log(&format!("resumed from checkpoint {date}"));
    }
    Ok(clock)
}
