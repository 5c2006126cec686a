//! Periodic refresh scheduling.
//!
//! The scheduler is either idle or running exactly one cycle. Triggers that
//! arrive while a cycle is in flight are coalesced (dropped), never queued, and
//! interval deadlines missed because a cycle overran are skipped. A manual
//! refresh is also dropped when a cycle started after it was requested.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::app::pipeline;
use crate::data::{DataAdapter, MarketSource};
use crate::domain::FeedConfig;
use crate::error::{AppError, FeedError};

mod store;

pub use store::SnapshotStore;

/// What happened to a refresh trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A cycle ran and published the snapshot with this sequence.
    Published(u64),
    /// Another cycle was in flight; nothing ran.
    Coalesced,
}

enum Command {
    /// Manual refresh, stamped with the time it was requested.
    RefreshNow(Instant),
    Shutdown,
}

pub struct RefreshScheduler<S> {
    adapter: DataAdapter<S>,
    store: Arc<SnapshotStore>,
    interval: Duration,
    in_flight: AtomicBool,
    refresh_requested: AtomicBool,
    next_sequence: AtomicU64,
    last_started: Mutex<Option<Instant>>,
}

impl<S: MarketSource + 'static> RefreshScheduler<S> {
    /// Validate `config` and wrap `source`.
    pub fn new(source: S, config: &FeedConfig) -> Result<Self, FeedError> {
        config.validate()?;
        Ok(Self {
            adapter: DataAdapter::new(source),
            store: Arc::new(SnapshotStore::new()),
            interval: config.refresh_interval,
            in_flight: AtomicBool::new(false),
            refresh_requested: AtomicBool::new(false),
            next_sequence: AtomicU64::new(1),
            last_started: Mutex::new(None),
        })
    }

    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one cycle unless one is already in flight.
    pub fn try_refresh(&self) -> RefreshOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("refresh coalesced: cycle already in flight");
            return RefreshOutcome::Coalesced;
        }
        let _guard = InFlight(&self.in_flight);
        *self.cycle_started_at() = Some(Instant::now());

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let snapshot = pipeline::run_cycle(&self.adapter, sequence);
        self.store.publish(snapshot);
        RefreshOutcome::Published(sequence)
    }

    fn cycle_started_at(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a cycle started at or after `instant`, and so already covers a
    /// request made at that time.
    fn started_since(&self, instant: Instant) -> bool {
        self.cycle_started_at()
            .is_some_and(|started| started >= instant)
    }

    /// Start the worker thread: one cycle immediately, then one per interval.
    pub fn spawn(self) -> Result<SchedulerHandle<S>, AppError> {
        let scheduler = Arc::new(self);
        let (commands, rx) = mpsc::channel();

        let worker = Arc::clone(&scheduler);
        let thread = thread::Builder::new()
            .name("pulse-refresh".to_string())
            .spawn(move || worker.run(rx))
            .map_err(|e| AppError::new(4, format!("Failed to start refresh thread: {e}")))?;

        info!(interval = ?scheduler.interval, "scheduler started");
        Ok(SchedulerHandle {
            scheduler,
            commands,
            thread: Some(thread),
        })
    }

    fn run(&self, commands: Receiver<Command>) {
        let mut next_tick = Instant::now();
        loop {
            let now = Instant::now();
            if now >= next_tick {
                self.try_refresh();
                let (next, skipped) = next_deadline(next_tick, self.interval, Instant::now());
                if skipped > 0 {
                    debug!(skipped, "cycle overran interval; ticks skipped");
                }
                next_tick = next;
                continue;
            }

            match commands.recv_timeout(next_tick - now) {
                Ok(Command::RefreshNow(requested_at)) => {
                    self.refresh_requested.store(false, Ordering::Release);
                    if self.started_since(requested_at) {
                        debug!("manual refresh coalesced: cycle started after the request");
                    } else {
                        self.try_refresh();
                    }
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
        info!("scheduler stopped");
    }
}

/// Clears the in-flight flag even if a cycle panics.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// First deadline after `now` on the `previous + k * interval` grid, plus the
/// number of grid points skipped.
fn next_deadline(previous: Instant, interval: Duration, now: Instant) -> (Instant, u32) {
    let mut next = previous + interval;
    let mut skipped = 0;
    while next <= now {
        next += interval;
        skipped += 1;
    }
    (next, skipped)
}

/// Owner of a running scheduler thread. Dropping it stops the thread.
pub struct SchedulerHandle<S: MarketSource + 'static> {
    scheduler: Arc<RefreshScheduler<S>>,
    commands: Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl<S: MarketSource + 'static> SchedulerHandle<S> {
    pub fn store(&self) -> Arc<SnapshotStore> {
        self.scheduler.store()
    }

    pub fn is_refreshing(&self) -> bool {
        self.scheduler.is_refreshing()
    }

    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }

    /// Ask for an out-of-band cycle. Returns `false` when the request was
    /// coalesced into a cycle that is running or already requested.
    ///
    /// A request accepted here can still be dropped by the worker if a
    /// scheduled cycle starts before the worker gets to it.
    pub fn refresh_now(&self) -> bool {
        let requested_at = Instant::now();
        if self.scheduler.is_refreshing() {
            debug!("manual refresh coalesced: cycle in flight");
            return false;
        }
        if self.scheduler.refresh_requested.swap(true, Ordering::AcqRel) {
            debug!("manual refresh coalesced: already requested");
            return false;
        }
        let command = Command::RefreshNow(requested_at);
        self.commands.send(command).is_ok()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.commands.send(Command::Shutdown);
        if thread.join().is_err() {
            warn!("refresh thread panicked");
        }
    }
}

impl<S: MarketSource + 'static> Drop for SchedulerHandle<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
