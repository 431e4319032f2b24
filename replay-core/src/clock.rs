//! Market simulation clock — a phased day-stepping state machine.
//!
//! One cycle per trading day: `BeforeOpen → Open → Close → AfterClose`, then
//! `advance()` moves to the next date. The clock owns its feeds and is the
//! sole mutator of `current_date` and the benchmark history; accounts are
//! registered with it and called back at day end. Strategy logic plugs in as
//! phase hooks, invoked synchronously in registration order with the clock
//! itself, so a hook can read quotes and submit orders.

use crate::account::Account;
use crate::calendar::{CalendarError, TradingCalendar};
use crate::domain::{BenchmarkPoint, FillTiming, Order, PriceRecord, SecurityId};
use crate::feed::{FeedError, PriceFeed, QuoteSource};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// The four phases of a simulated trading day, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BeforeOpen,
    Open,
    Close,
    AfterClose,
}

/// A phase subscriber. Hook registration is append-only; hooks run
/// synchronously in registration order.
pub type PhaseHook = Box<dyn FnMut(&mut Clock)>;

/// Adapter so a borrowed feed can be handed out as a plain quote lookup.
struct FeedQuotes<'a>(&'a dyn PriceFeed);

impl QuoteSource for FeedQuotes<'_> {
    fn quote(&self, security: SecurityId) -> Option<&PriceRecord> {
        self.0.quote(security)
    }
}

/// Serializable portion of the clock + account graph.
///
/// Feeds, hooks, and the day log are deliberately absent: they hold external
/// resources and are reconstructed by the caller on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub current_date: NaiveDate,
    pub benchmark_history: Vec<BenchmarkPoint>,
    pub accounts: Vec<Account>,
}

pub struct Clock {
    current_date: NaiveDate,
    /// feed[0] is the canonical quote source for matching; an optional feed
    /// flagged benchmark (conventionally last) supplies the index series.
    feeds: Vec<Box<dyn PriceFeed>>,
    accounts: Vec<Account>,
    before_open_hooks: Vec<PhaseHook>,
    open_hooks: Vec<PhaseHook>,
    close_hooks: Vec<PhaseHook>,
    after_close_hooks: Vec<PhaseHook>,
    benchmark_history: Vec<BenchmarkPoint>,
    day_log: Option<DayLog>,
}

impl Clock {
    /// Seed the clock at `initial_date`; the first `advance()` moves strictly
    /// past it.
    pub fn new(initial_date: NaiveDate) -> Self {
        Self {
            current_date: initial_date,
            feeds: Vec::new(),
            accounts: Vec::new(),
            before_open_hooks: Vec::new(),
            open_hooks: Vec::new(),
            close_hooks: Vec::new(),
            after_close_hooks: Vec::new(),
            benchmark_history: Vec::new(),
            day_log: None,
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn benchmark_history(&self) -> &[BenchmarkPoint] {
        &self.benchmark_history
    }

    // ── Registration ────────────────────────────────────────────────

    pub fn add_feed(&mut self, feed: Box<dyn PriceFeed>) {
        self.feeds.push(feed);
    }

    /// Register an account; returns its index for later `submit` calls.
    pub fn add_account(&mut self, account: Account) -> usize {
        self.accounts.push(account);
        self.accounts.len() - 1
    }

    pub fn add_hook(&mut self, phase: Phase, hook: PhaseHook) {
        self.hooks_mut(phase).push(hook);
    }

    pub fn account(&self, index: usize) -> Option<&Account> {
        self.accounts.get(index)
    }

    pub fn account_mut(&mut self, index: usize) -> Option<&mut Account> {
        self.accounts.get_mut(index)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Current quote for a security from the canonical feed.
    pub fn quote(&self, security: SecurityId) -> Option<&PriceRecord> {
        self.feeds.first().and_then(|f| f.quote(security))
    }

    // ── Phases ──────────────────────────────────────────────────────

    /// Ask the calendar for the next trading date strictly after the current
    /// one. `Ok(false)` on exhaustion, `Err` on a lookup failure; no state
    /// changes in either case.
    pub fn advance(&mut self, calendar: &dyn TradingCalendar) -> Result<bool, CalendarError> {
        let next = match calendar.next_trading_date(self.current_date) {
            Ok(next) => next,
            Err(e) => {
                self.log(&format!("calendar lookup failed: {e}"));
                return Err(e);
            }
        };
        let Some(date) = next else {
            self.log("trading calendar exhausted");
            return Ok(false);
        };
        self.current_date = date;
        if let Some(log) = &mut self.day_log {
            log.rotate(date);
        }
        self.log("advanced to new trading date");
        Ok(true)
    }

    /// Clear every feed's per-day cache, then fire the before-open hooks.
    pub fn before_open(&mut self) {
        for feed in &mut self.feeds {
            feed.clear();
        }
        self.run_hooks(Phase::BeforeOpen);
    }

    /// Fire the open hooks; at-open orders are submitted and matched here.
    pub fn open(&mut self) {
        self.run_hooks(Phase::Open);
    }

    /// Fire the close hooks; at-close orders are submitted and matched here.
    pub fn close(&mut self) {
        self.run_hooks(Phase::Close);
    }

    /// Pull fresh data into every feed, record the day's benchmark row, fire
    /// the after-close hooks, then finalize every registered account.
    pub fn after_close(&mut self) -> Result<(), FeedError> {
        let date = self.current_date;
        for feed in &mut self.feeds {
            feed.pull(date)?;
        }

        let benchmark = self
            .feeds
            .last()
            .filter(|f| f.is_benchmark())
            .and_then(|f| f.first_quote())
            .map(|q| BenchmarkPoint {
                date,
                value: q.close.unwrap_or(1.0),
                daily_return: q.adj_return.unwrap_or(0.0),
            })
            .unwrap_or_else(|| BenchmarkPoint::neutral(date));
        self.benchmark_history.push(benchmark.clone());

        self.run_hooks(Phase::AfterClose);

        match self.feeds.first() {
            Some(feed) => {
                let quotes = FeedQuotes(feed.as_ref());
                for account in &mut self.accounts {
                    account.finalize_day(date, &benchmark, &quotes);
                }
            }
            None => {
                let no_quotes: Vec<Option<PriceRecord>> = Vec::new();
                for account in &mut self.accounts {
                    account.finalize_day(date, &benchmark, &no_quotes);
                }
            }
        }
        Ok(())
    }

    /// Submit an order for a registered account against the canonical feed's
    /// current quote.
    pub fn submit(&mut self, account: usize, order: Order) -> bool {
        let quote = self
            .feeds
            .first()
            .and_then(|f| f.quote(order.security))
            .cloned();
        let date = self.current_date;
        match self.accounts.get_mut(account) {
            Some(acct) => acct.submit(order, quote.as_ref(), date),
            None => false,
        }
    }

    /// Flatten every holding of a registered account at current quotes.
    pub fn liquidate_all(&mut self, account: usize, timing: FillTiming, annotation: &str) -> usize {
        let Some(feed) = self.feeds.first() else {
            return 0;
        };
        let quotes = FeedQuotes(feed.as_ref());
        let date = self.current_date;
        match self.accounts.get_mut(account) {
            Some(acct) => acct.liquidate_all(&quotes, timing, date, annotation),
            None => 0,
        }
    }

    fn hooks_mut(&mut self, phase: Phase) -> &mut Vec<PhaseHook> {
        match phase {
            Phase::BeforeOpen => &mut self.before_open_hooks,
            Phase::Open => &mut self.open_hooks,
            Phase::Close => &mut self.close_hooks,
            Phase::AfterClose => &mut self.after_close_hooks,
        }
    }

    fn run_hooks(&mut self, phase: Phase) {
        // Take the list out so hooks can borrow the clock mutably; hooks
        // registered during dispatch land in the (now empty) slot and are
        // spliced back in registration order afterwards.
        let mut hooks = std::mem::take(self.hooks_mut(phase));
        for hook in hooks.iter_mut() {
            hook(self);
        }
        let registered_during_dispatch = std::mem::take(self.hooks_mut(phase));
        hooks.extend(registered_during_dispatch);
        *self.hooks_mut(phase) = hooks;
    }

    // ── Snapshot / restore ──────────────────────────────────────────

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            current_date: self.current_date,
            benchmark_history: self.benchmark_history.clone(),
            accounts: self.accounts.clone(),
        }
    }

    /// Overwrite the serializable state from a snapshot. Feeds and hooks are
    /// untouched; the caller re-registers those before resuming.
    pub fn restore(&mut self, snapshot: ClockSnapshot) {
        self.current_date = snapshot.current_date;
        self.benchmark_history = snapshot.benchmark_history;
        self.accounts = snapshot.accounts;
        if let Some(log) = &mut self.day_log {
            log.rotate(self.current_date);
        }
    }

    // ── Day log ─────────────────────────────────────────────────────

    /// Attach a per-day log rotating on each date advance.
    pub fn attach_day_log(&mut self, dir: impl Into<PathBuf>) -> std::io::Result<()> {
        self.day_log = Some(DayLog::open(dir.into(), self.current_date)?);
        Ok(())
    }

    /// Detach the log handle (a non-serializable resource) — reattach with
    /// [`Clock::attach_day_log`] after snapshot-related plumbing if needed.
    pub fn detach_day_log(&mut self) -> Option<DayLog> {
        self.day_log.take()
    }

    pub fn log(&mut self, message: &str) {
        if let Some(log) = &mut self.day_log {
            log.write(message);
        }
    }
}

/// Date-keyed simulation log: one plain-text file per trading day.
pub struct DayLog {
    dir: PathBuf,
    file: Option<BufWriter<File>>,
}

impl DayLog {
    pub fn open(dir: PathBuf, date: NaiveDate) -> std::io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let mut log = Self { dir, file: None };
        log.rotate(date);
        Ok(log)
    }

    /// Switch to the file for `date`, creating it if needed. Logging must
    /// never take the simulation down, so open failures leave the log muted.
    pub fn rotate(&mut self, date: NaiveDate) {
        let path = self.dir.join(format!("log-{}.txt", date.format("%Y-%m-%d")));
        self.file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
            .map(BufWriter::new);
    }

    pub fn write(&mut self, message: &str) {
        if let Some(file) = &mut self.file {
            let _ = writeln!(file, "[{}] {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"), message);
            let _ = file.flush();
        }
    }
}
