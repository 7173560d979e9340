/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Tokio wiring for the scheduler: the coalescing wake-up signal, the
//! re-armable slot timer task, and the worker loop.
//!
//! The concurrency shape mirrors the flight design: two asynchronous
//! contexts (pulse, timer expiry) mutate the shared scheduler behind one
//! mutex and raise a single binary wake-up; the worker blocks on that
//! wake-up and recomputes its work from state.  The wake-up coalesces — a
//! raise while already signalled is a no-op, never an error, so the worker
//! can never be double-counted into extra work or starved of a pending one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info};

use crate::scheduler::{BusError, MessageBus, MetClock, Scheduler, SlotTimer, StartError};

// ── WakeSignal ────────────────────────────────────────────────────────────────

/// Binary, coalescing wake-up primitive.
///
/// [`raise`](Self::raise) stores at most one permit;
/// [`wait`](Self::wait) consumes it (or blocks until one arrives).
pub struct WakeSignal {
    notify: Notify,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
        }
    }

    /// Signal the worker.  Callable from any context; never blocks.
    pub fn raise(&self) {
        self.notify.notify_one();
    }

    /// Block until the next raise.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ── TokioSlotTimer ────────────────────────────────────────────────────────────

/// Current timer programming: next expiry after `first`, then every
/// `interval`.  Both zero means stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerProgram {
    first: Duration,
    interval: Duration,
}

/// Re-armable slot timer backed by a tokio task.
///
/// [`arm`](SlotTimer::arm) replaces the pending expiry through a `watch`
/// channel, preempting the in-flight sleep — the exact semantics the
/// synchronizer's handlers rely on when they cancel the long slot or absorb
/// an overrun.
pub struct TokioSlotTimer {
    program_tx: watch::Sender<TimerProgram>,
    receiver: Mutex<Option<watch::Receiver<TimerProgram>>>,
    accuracy: Duration,
}

impl TokioSlotTimer {
    /// A stopped timer.  The driving task is spawned by
    /// [`SchedulerRuntime::start`].
    pub fn new() -> Self {
        Self::with_accuracy(Duration::from_millis(1))
    }

    /// Override the reported accuracy (the tokio timer wheel resolves to
    /// about a millisecond; an embedded port would report its own value).
    pub fn with_accuracy(accuracy: Duration) -> Self {
        let (program_tx, rx) = watch::channel(TimerProgram {
            first: Duration::ZERO,
            interval: Duration::ZERO,
        });
        Self {
            program_tx,
            receiver: Mutex::new(Some(rx)),
            accuracy,
        }
    }

    fn claim_receiver(&self) -> Option<watch::Receiver<TimerProgram>> {
        self.receiver.lock().take()
    }
}

impl Default for TokioSlotTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotTimer for TokioSlotTimer {
    fn accuracy(&self) -> Duration {
        self.accuracy
    }

    fn arm(&self, first: Duration, interval: Duration) {
        self.program_tx.send_replace(TimerProgram { first, interval });
    }
}

/// The timer task: sleep for the programmed interval, deliver a tick, and
/// let any re-arm preempt the sleep.
async fn run_timer(mut rx: watch::Receiver<TimerProgram>, scheduler: Arc<Mutex<Scheduler>>) {
    let mut program = *rx.borrow_and_update();

    loop {
        let delay = if program.first.is_zero() {
            program.interval
        } else {
            program.first
        };

        if delay.is_zero() {
            // stopped — wait for a re-arm
            if rx.changed().await.is_err() {
                return;
            }
            program = *rx.borrow_and_update();
            continue;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
                program = *rx.borrow_and_update();
            }
            _ = tokio::time::sleep(delay) => {
                scheduler.lock().on_minor_frame_tick();

                // continue on the repeat interval unless the tick re-armed
                program = TimerProgram {
                    first: Duration::ZERO,
                    interval: program.interval,
                };
                if rx.has_changed().unwrap_or(false) {
                    program = *rx.borrow_and_update();
                }
            }
        }
    }
}

/// The worker loop: wait, lock, process.  A failing sync-slot hook aborts
/// one pass, never the loop.
async fn run_worker(wake: Arc<WakeSignal>, scheduler: Arc<Mutex<Scheduler>>) {
    loop {
        wake.wait().await;
        let result = scheduler.lock().process_due_slots();
        if let Err(err) = result {
            error!(%err, "slot pass aborted");
        }
    }
}

// ── SchedulerRuntime ──────────────────────────────────────────────────────────

/// Owns the scheduler's runtime wiring: one timer task, one worker loop,
/// and the external pulse entry point.
pub struct SchedulerRuntime {
    scheduler: Arc<Mutex<Scheduler>>,
    timer: Arc<TokioSlotTimer>,
}

impl SchedulerRuntime {
    pub fn new(scheduler: Arc<Mutex<Scheduler>>, timer: Arc<TokioSlotTimer>) -> Self {
        Self { scheduler, timer }
    }

    pub fn scheduler(&self) -> Arc<Mutex<Scheduler>> {
        Arc::clone(&self.scheduler)
    }

    /// Startup sequence: spawn the timer task and the worker loop, then arm
    /// the timer with the extended startup delay so an external pulse has a
    /// chance to take over before the local timer does.
    pub fn start(&self) -> Result<(), StartError> {
        let Some(rx) = self.timer.claim_receiver() else {
            error!("scheduler runtime already started");
            return Err(StartError::AlreadyStarted);
        };

        let (startup_delay, wake) = {
            let sched = self.scheduler.lock();
            (sched.profile().startup_delay, sched.wake_signal())
        };

        tokio::spawn(run_timer(rx, Arc::clone(&self.scheduler)));
        tokio::spawn(run_worker(wake, Arc::clone(&self.scheduler)));

        self.timer.arm(startup_delay, Duration::ZERO);
        info!(
            startup_ms = startup_delay.as_millis() as u64,
            "slot timer armed with startup delay"
        );
        Ok(())
    }

    /// External pulse entry point — the host application calls this from
    /// its 1 Hz time-reference notification.
    pub fn major_frame_pulse(&self) {
        self.scheduler.lock().on_major_frame_pulse();
    }
}

// ── Host-side default collaborators ───────────────────────────────────────────

/// MET clock anchored at process start.  Never free-running.
pub struct EpochMetClock {
    epoch: Instant,
}

impl EpochMetClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for EpochMetClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MetClock for EpochMetClock {
    fn met_subsecond_micros(&self) -> u32 {
        self.epoch.elapsed().subsec_micros()
    }

    fn is_free_running(&self) -> bool {
        false
    }
}

/// A message bus that logs frames instead of transmitting them.  Stands in
/// for the software bus during bench runs.
pub struct LogBus;

impl MessageBus for LogBus {
    fn transmit(&self, frame: &[u8]) -> Result<(), BusError> {
        let stream_id = if frame.len() >= 2 {
            u16::from_be_bytes([frame[0], frame[1]])
        } else {
            0
        };
        debug!(
            len = frame.len(),
            stream_id = format_args!("0x{stream_id:04X}"),
            "frame transmitted"
        );
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
