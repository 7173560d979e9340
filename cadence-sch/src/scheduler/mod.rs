/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Slot engine and command surface for the Cadence scheduler.
//!
//! [`Scheduler`] owns the two tables, the frame-synchronization state and the
//! lifetime counters, and is driven from three places:
//!
//! * the external 1 Hz pulse handler ([`Scheduler::on_major_frame_pulse`]),
//! * the local slot-timer handler ([`Scheduler::on_minor_frame_tick`]),
//! * the worker loop, which blocks on the coalescing wake-up signal and calls
//!   [`Scheduler::process_due_slots`].
//!
//! # Design decisions vs the original flight code
//!
//! | Topic | Flight code | Rust |
//! |---|---|---|
//! | State | Process-wide singleton behind a static pointer | Explicit `Scheduler` context; callers share it behind one mutex |
//! | Callback contexts | Arbitrary code in timer-service context | Handlers are small, allocation-free `&mut self` methods plus a coalescing notify |
//! | Table indexing | Pointer arithmetic into a flattened array | Bounds-checked 2D accessors at the API boundary |
//! | Sync flags | Bit masks packed in one integer | [`MetSync`] named-field bitset with accessors for the tested combinations |
//! | Dispatch failure | Error code compared against a success constant | `Result` + typed [`BusError`] |
//!
//! Work quantity is always recomputed from state, never from the number of
//! wake-up signals: a pulse and a tick landing together still produce one
//! pass over the slots that actually elapsed.

pub mod error;
pub mod sync;
pub mod telemetry;

pub use error::{BusError, CommandError, HookError, StartError};
pub use sync::{MajorFrameSource, MetSync};
pub use telemetry::{DiagPacket, EntryRecordPacket};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::msgtbl::{MessageEntry, MsgTable};
use crate::profile::{FrameProfile, ProfileError};
use crate::runtime::WakeSignal;
use crate::schtbl::{SchTable, ScheduleEntry};
use sync::FrameSync;

// ── Collaborator contracts ────────────────────────────────────────────────────

/// Underlying transport for dispatched activities and telemetry packets.
///
/// Implementations must be cheap and non-blocking — `transmit` runs inside
/// the worker's critical section.
pub trait MessageBus: Send + Sync {
    fn transmit(&self, frame: &[u8]) -> Result<(), BusError>;
}

/// Mission-elapsed-time source.
///
/// Only the sub-second part matters to the scheduler: slots repeat every
/// second.  `is_free_running` reports whether the time base is currently
/// untrustworthy (free-wheeling), in which case the external pulse is
/// ignored entirely.
pub trait MetClock: Send + Sync {
    fn met_subsecond_micros(&self) -> u32;
    fn is_free_running(&self) -> bool;
}

/// Re-armable slot timer.
///
/// `arm(first, interval)` replaces any pending expiry: the next expiry comes
/// after `first`, subsequent ones every `interval` (one-shot when `interval`
/// is zero).  `accuracy` reports the timer's resolution so the scheduler can
/// decide whether minor frames must be MET-synchronized.
pub trait SlotTimer: Send + Sync {
    fn accuracy(&self) -> Duration;
    fn arm(&self, first: Duration, interval: Duration);
}

/// Deferred ground-command drain, invoked at the time-sync slot boundary.
///
/// Draining at the end of the table keeps group enable/disable commands from
/// changing entry state in the middle of a schedule pass.  What draining
/// means is the owning application's decision; the default does nothing.
pub trait SyncSlotHook: Send {
    fn process(&mut self) -> Result<(), HookError>;
}

/// The default hook: no ground-command processing.
#[derive(Debug, Default)]
pub struct NoopSyncSlotHook;

impl SyncSlotHook for NoopSyncSlotHook {
    fn process(&mut self) -> Result<(), HookError> {
        Ok(())
    }
}

// ── Counters ──────────────────────────────────────────────────────────────────

/// Lifetime statistics.  Monotonic; zeroed only by [`Scheduler::reset_status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatCounters {
    pub slots_processed: u32,
    pub slots_skipped: u32,
    pub multi_slot_events: u32,
    pub same_slot_events: u32,
    pub activity_success: u32,
    pub activity_failure: u32,
    pub valid_major_frames: u32,
    pub missed_major_frames: u32,
    pub unexpected_major_frames: u32,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// The scheduler context: tables, synchronization state, counters, and the
/// collaborator seams.
///
/// Constructed once; shared between the worker loop and the two asynchronous
/// handlers behind a mutex (see [`crate::runtime`]).  The worker is the sole
/// mutator of `next_slot`, `table_pass_count` and the table contents; the
/// handlers touch only the synchronization scalars.
pub struct Scheduler {
    profile: FrameProfile,
    msg_tbl: MsgTable,
    sch_tbl: SchTable,
    pub(crate) sync: FrameSync,
    counters: StatCounters,

    /// Next slot due for dispatch, `[0, slots)`.
    next_slot: u16,
    /// Full table traversals completed; modulus base for period/offset.
    table_pass_count: u32,
    /// Hysteresis memory for the anti-jitter corrections.
    last_process_count: u32,
    /// Slots a single coarse timer expiry may legitimately cover.
    worst_case_slots_per_minor_frame: u32,
    clock_accuracy: Duration,

    bus: Arc<dyn MessageBus>,
    clock: Arc<dyn MetClock>,
    timer: Arc<dyn SlotTimer>,
    hook: Box<dyn SyncSlotHook>,
    wake: Arc<WakeSignal>,
}

impl Scheduler {
    /// Build a scheduler for `profile` with freshly zeroed tables.
    ///
    /// Queries the timer's accuracy: when it is coarser than the profile's
    /// worst acceptable value, minor frames are synchronized to MET from the
    /// start so slots cannot be lost to timer drift.
    pub fn new(
        profile: FrameProfile,
        bus: Arc<dyn MessageBus>,
        clock: Arc<dyn MetClock>,
        timer: Arc<dyn SlotTimer>,
    ) -> Result<Self, ProfileError> {
        profile.validate()?;

        let clock_accuracy = timer.accuracy();
        let accuracy_us = clock_accuracy.as_micros().min(u128::from(u32::MAX)) as u32;

        let mut sync = FrameSync::new(&profile);
        let mut worst_case = 1;
        if accuracy_us > profile.worst_clock_accuracy_us {
            info!(
                accuracy_us,
                required_us = profile.worst_clock_accuracy_us,
                "timer accuracy requires minor frame MET sync"
            );
            sync.met.set_minor();
            worst_case =
                ((u64::from(accuracy_us) * 2) / u64::from(profile.slot_period_us()) + 1) as u32;
        }

        Ok(Self {
            msg_tbl: MsgTable::new(profile.msg_entries),
            sch_tbl: SchTable::new(profile.slots, profile.activities_per_slot),
            sync,
            counters: StatCounters::default(),
            next_slot: 0,
            table_pass_count: 0,
            last_process_count: 0,
            worst_case_slots_per_minor_frame: worst_case,
            clock_accuracy,
            bus,
            clock,
            timer,
            hook: Box::new(NoopSyncSlotHook),
            wake: Arc::new(WakeSignal::new()),
            profile,
        })
    }

    /// Install the ground-command drain hook.
    pub fn set_sync_slot_hook(&mut self, hook: Box<dyn SyncSlotHook>) {
        self.hook = hook;
    }

    // ── Read-only surface ─────────────────────────────────────────────────────

    pub fn profile(&self) -> &FrameProfile {
        &self.profile
    }

    pub fn msg_table(&self) -> &MsgTable {
        &self.msg_tbl
    }

    pub fn sch_table(&self) -> &SchTable {
        &self.sch_tbl
    }

    pub fn counters(&self) -> StatCounters {
        self.counters
    }

    pub fn next_slot(&self) -> u16 {
        self.next_slot
    }

    pub fn table_pass_count(&self) -> u32 {
        self.table_pass_count
    }

    pub fn is_ignoring_major_frame(&self) -> bool {
        self.sync.ignore_major_frame
    }

    pub fn major_frame_source(&self) -> MajorFrameSource {
        self.sync.source
    }

    pub fn clock_accuracy(&self) -> Duration {
        self.clock_accuracy
    }

    pub fn worst_case_slots_per_minor_frame(&self) -> u32 {
        self.worst_case_slots_per_minor_frame
    }

    /// The coalescing wake-up signal both handlers raise and the worker
    /// blocks on.
    pub fn wake_signal(&self) -> Arc<WakeSignal> {
        Arc::clone(&self.wake)
    }

    // ── Status reset ──────────────────────────────────────────────────────────

    /// Zero all counters and stop ignoring the external pulse.
    ///
    /// Table contents, `next_slot` and `table_pass_count` are deliberately
    /// untouched: zeroing the pass counter would re-phase every
    /// period/offset activity.
    pub fn reset_status(&mut self) {
        self.counters = StatCounters::default();
        self.sync.consecutive_noisy_frames = 0;
        self.sync.ignore_major_frame = false;
    }

    // ── Command handlers ──────────────────────────────────────────────────────

    /// Toggle an existing entry.  Enabling re-validates the stored entry —
    /// the schedule table is critical, so nothing about previously loaded
    /// values is assumed.  Disabling always succeeds.
    pub fn config_entry(
        &mut self,
        slot: u16,
        activity: u16,
        enabled: bool,
    ) -> Result<(), CommandError> {
        self.entry_coords(slot, activity, "config entry cmd rejected")?;

        if enabled {
            if let Some(entry) = self.sch_tbl.entry(slot, activity) {
                if let Err(fault) = entry.check(self.profile.msg_entries) {
                    error!(slot, activity, %fault, "config cmd failed to enable entry");
                    return Err(CommandError::EntryRejected {
                        slot,
                        activity,
                        fault,
                    });
                }
            }
        }

        if let Some(entry) = self.sch_tbl.entry_mut(slot, activity) {
            entry.enabled = enabled;
        }
        info!(slot, activity, enabled, "configured schedule entry");
        Ok(())
    }

    /// Overwrite one entry with fully validated fields.
    pub fn load_entry(
        &mut self,
        slot: u16,
        activity: u16,
        entry: ScheduleEntry,
    ) -> Result<(), CommandError> {
        self.entry_coords(slot, activity, "load entry cmd rejected")?;

        if let Err(fault) = entry.check(self.profile.msg_entries) {
            error!(slot, activity, %fault, "load entry cmd rejected");
            return Err(CommandError::EntryRejected {
                slot,
                activity,
                fault,
            });
        }

        if let Some(target) = self.sch_tbl.entry_mut(slot, activity) {
            *target = entry;
        }
        info!(
            slot,
            activity,
            enabled = entry.enabled,
            period = entry.period,
            offset = entry.offset,
            msg_index = entry.msg_index,
            "loaded schedule entry"
        );
        Ok(())
    }

    /// Report one schedule entry: an informational event plus an
    /// entry-record telemetry packet mirroring the referenced message.
    pub fn send_entry(&self, slot: u16, activity: u16) -> Result<(), CommandError> {
        self.entry_coords(slot, activity, "send entry cmd rejected")?;

        let entry = self
            .sch_tbl
            .entry(slot, activity)
            .copied()
            .unwrap_or_default();
        info!(
            slot,
            activity,
            enabled = entry.enabled,
            period = entry.period,
            offset = entry.offset,
            msg_index = entry.msg_index,
            "schedule entry"
        );

        self.send_entry_record(Some((slot, activity)), entry.msg_index)
    }

    /// (Re)initialise one message table entry's header for `msg_id`.
    pub fn load_msg_entry(&mut self, index: u16, msg_id: u16) -> Result<(), CommandError> {
        let Some(entry) = self.msg_tbl.entry_mut(index) else {
            error!(
                index,
                max = self.profile.msg_entries - 1,
                "load message entry cmd rejected"
            );
            return Err(CommandError::InvalidMsgIndex {
                index,
                max: self.profile.msg_entries - 1,
            });
        };

        entry.init(msg_id);
        info!(
            index,
            word0 = format_args!("0x{:04X}", entry.word(0)),
            word1 = format_args!("0x{:04X}", entry.word(1)),
            word2 = format_args!("0x{:04X}", entry.word(2)),
            word3 = format_args!("0x{:04X}", entry.word(3)),
            "loaded message entry"
        );
        Ok(())
    }

    /// Report one message table entry: header fields and the first payload
    /// words as events, plus an entry-record packet cross-referencing the
    /// first schedule entry that points at this index.
    pub fn send_msg_entry(&self, index: u16) -> Result<(), CommandError> {
        let Some(entry) = self.msg_tbl.entry(index) else {
            error!(
                index,
                max = self.profile.msg_entries - 1,
                "send message entry cmd rejected"
            );
            return Err(CommandError::InvalidMsgIndex {
                index,
                max: self.profile.msg_entries - 1,
            });
        };

        match entry.msg_type() {
            crate::msgtbl::MsgType::Command => info!(
                index,
                apid = format_args!("0x{:04X}", entry.apid()),
                seq = entry.sequence_count(),
                len = entry.total_length(),
                function_code = entry.function_code(),
                checksum = format_args!("0x{:02X}", entry.checksum()),
                "message entry (command)"
            ),
            crate::msgtbl::MsgType::Telemetry => info!(
                index,
                apid = format_args!("0x{:04X}", entry.apid()),
                seq = entry.sequence_count(),
                len = entry.total_length(),
                seconds = entry.time_seconds(),
                subseconds = entry.time_subseconds(),
                "message entry (telemetry)"
            ),
        }

        info!(
            d0 = format_args!("0x{:04X}", entry.payload_word(0).unwrap_or(0)),
            d1 = format_args!("0x{:04X}", entry.payload_word(1).unwrap_or(0)),
            d2 = format_args!("0x{:04X}", entry.payload_word(2).unwrap_or(0)),
            d3 = format_args!("0x{:04X}", entry.payload_word(3).unwrap_or(0)),
            "message payload words"
        );

        self.send_entry_record(self.sch_tbl.find_msg_ref(index), index)
    }

    // ── Bulk / raw table surface (table-manager collaborator) ─────────────────

    /// Replace the whole schedule table.  No per-entry validation — the
    /// external validator collaborator is expected to have run first.
    pub fn load_sch_table(&mut self, table: &SchTable) -> Result<(), CommandError> {
        if table.len() != self.sch_tbl.len() {
            return Err(CommandError::TableSizeMismatch {
                expected: self.sch_tbl.len(),
                actual: table.len(),
            });
        }
        self.sch_tbl.overwrite(table);
        info!(entries = table.len(), "schedule table loaded");
        Ok(())
    }

    /// Replace the whole message table.  No validation.
    pub fn load_msg_table(&mut self, table: &MsgTable) -> Result<(), CommandError> {
        if table.len() != self.msg_tbl.len() {
            return Err(CommandError::TableSizeMismatch {
                expected: self.msg_tbl.len(),
                actual: table.len(),
            });
        }
        self.msg_tbl.overwrite(table);
        info!(entries = table.len(), "message table loaded");
        Ok(())
    }

    /// Overwrite one schedule entry by flat index, unvalidated.
    pub fn load_sch_entry_raw(
        &mut self,
        index: usize,
        entry: ScheduleEntry,
    ) -> Result<(), CommandError> {
        let max = self.sch_tbl.len() - 1;
        let Some(slot) = self.sch_tbl.entry_flat_mut(index) else {
            return Err(CommandError::InvalidSlot {
                slot: index as u16,
                max: max as u16,
            });
        };
        *slot = entry;
        Ok(())
    }

    /// Overwrite one message entry's raw buffer, unvalidated.
    pub fn load_msg_entry_raw(
        &mut self,
        index: u16,
        entry: &MessageEntry,
    ) -> Result<(), CommandError> {
        let max = self.profile.msg_entries - 1;
        let Some(slot) = self.msg_tbl.entry_mut(index) else {
            return Err(CommandError::InvalidMsgIndex { index, max });
        };
        *slot = *entry;
        Ok(())
    }

    // ── Worker loop body ──────────────────────────────────────────────────────

    /// One wake-up's worth of work: compute how many slots have elapsed,
    /// apply the anti-jitter and catch-up corrections, and dispatch.
    ///
    /// Returns the number of slots actually dispatched.  The only early
    /// abort is a failing sync-slot hook; per-entry activity failures are
    /// local (§ dispatch).
    pub fn process_due_slots(&mut self) -> Result<u32, HookError> {
        let slots = u32::from(self.profile.slots);

        if self.sync.ignore_major_frame {
            if self.sync.send_noisy_notice {
                error!(
                    slot = self.sync.minor_frames_since_tone,
                    "major frame sync too noisy, disabling synchronization"
                );
                self.sync.send_noisy_notice = false;
            }
        } else {
            self.sync.send_noisy_notice = true;
        }

        let current_slot = self.current_slot();

        // Slots elapsed since next_slot, inclusive of the current slot
        let mut process_count = if current_slot < u32::from(self.next_slot) {
            slots - u32::from(self.next_slot) + current_slot + 1
        } else {
            current_slot - u32::from(self.next_slot) + 1
        };

        debug!(current_slot, process_count, "slot accounting");

        // Two-sided correction for a clock whose single wake can land a
        // little early or a little late.  One slot of hysteresis memory:
        // a lone anomaly is absorbed, a sustained one passes through.
        if process_count == 2 {
            // Woke late by one slot: if the previous pass was clean, do one
            // now and pick up the remainder on the next wake-up.
            if self.last_process_count == 1 {
                process_count = 1;
            }
            self.last_process_count = 2;
        } else if process_count == slots {
            // Woke early by one slot (reads as a full-table lap).
            if self.last_process_count != slots {
                process_count = 1;
            }
            self.last_process_count = slots;
        } else {
            self.last_process_count = process_count;
        }

        // current == next - 1 and the previous pass agreed: the clock did
        // not advance at all.
        if process_count == slots {
            self.counters.same_slot_events += 1;
            debug!(current_slot, "slot did not increment");
            process_count = 0;
        }

        // Too far behind: jump straight to the current slot.
        if process_count > self.profile.max_lag_slots {
            self.counters.slots_skipped += process_count - 1;
            error!(
                slot = self.next_slot,
                count = process_count - 1,
                "slots skipped"
            );

            // A skip across the rollover still completes a table pass
            if current_slot < u32::from(self.next_slot) {
                self.table_pass_count += 1;
            }

            // A skip across the time-sync slot still drains ground commands
            if u32::from(self.next_slot) + process_count > self.profile.time_sync_slot() {
                self.hook.process()?;
            }

            self.next_slot = current_slot as u16;
            process_count = 1;
        }

        // Bounded catch-up
        if process_count > self.profile.max_slots_per_wakeup {
            process_count = self.profile.max_slots_per_wakeup;
        }

        if process_count > 1 {
            self.counters.multi_slot_events += 1;

            // Routine under a coarse MET-synced timer; report only beyond
            // the expected worst case or when MET sync is off entirely.
            if process_count > self.worst_case_slots_per_minor_frame || self.sync.met.none() {
                info!(
                    slot = self.next_slot,
                    count = process_count,
                    "multiple slots processed"
                );
            }
        }

        debug!(process_count, "dispatching");

        let mut processed = 0;
        while processed < process_count {
            self.process_next_slot()?;
            processed += 1;
        }

        Ok(processed)
    }

    /// Dispatch every due activity in the slot at `next_slot`, then advance.
    fn process_next_slot(&mut self) -> Result<(), HookError> {
        let slot = self.next_slot;
        let activities = self.profile.activities_per_slot;

        for activity in 0..activities {
            let Some(index) = self.sch_tbl.index(slot, activity) else {
                continue;
            };
            let Some(entry) = self.sch_tbl.entry_flat(index).copied() else {
                continue;
            };

            if !entry.enabled {
                continue;
            }
            // An unvalidated zero period never comes due
            let due = entry.period != 0
                && self.table_pass_count % u32::from(entry.period) == u32::from(entry.offset);
            if !due {
                continue;
            }

            debug!(slot, activity, msg_index = entry.msg_index, "activity due");

            let sent = match self.msg_tbl.entry(entry.msg_index) {
                Some(msg) => match msg.wire_frame() {
                    Some(frame) => self.bus.transmit(frame),
                    None => Err(BusError::new("encoded length exceeds message buffer")),
                },
                None => Err(BusError::new("message index outside table")),
            };

            match sent {
                Ok(()) => self.counters.activity_success += 1,
                Err(err) => {
                    // Self-healing: a reference that cannot be dispatched is
                    // never retried
                    if let Some(target) = self.sch_tbl.entry_flat_mut(index) {
                        target.enabled = false;
                    }
                    self.counters.activity_failure += 1;
                    error!(slot, activity, %err, "activity dispatch failed, entry disabled");
                }
            }
        }

        if u32::from(slot) == self.profile.time_sync_slot() {
            self.hook.process()?;
        }

        self.next_slot += 1;
        if self.next_slot == self.profile.slots {
            self.next_slot = 0;
            self.table_pass_count += 1;
        }

        self.counters.slots_processed += 1;
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn entry_coords(&self, slot: u16, activity: u16, what: &str) -> Result<(), CommandError> {
        if slot >= self.profile.slots {
            error!(slot, max = self.profile.slots - 1, "{what}: invalid slot");
            return Err(CommandError::InvalidSlot {
                slot,
                max: self.profile.slots - 1,
            });
        }
        if activity >= self.profile.activities_per_slot {
            error!(
                activity,
                max = self.profile.activities_per_slot - 1,
                "{what}: invalid activity"
            );
            return Err(CommandError::InvalidActivity {
                activity,
                max: self.profile.activities_per_slot - 1,
            });
        }
        Ok(())
    }
}

// ── Test doubles ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testkit {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Records every transmitted frame; optionally fails on demand.
    #[derive(Default)]
    pub(crate) struct FakeBus {
        pub frames: Mutex<Vec<Vec<u8>>>,
        pub fail: AtomicBool,
    }

    impl MessageBus for FakeBus {
        fn transmit(&self, frame: &[u8]) -> Result<(), BusError> {
            if self.fail.load(Ordering::Relaxed) {
                return Err(BusError::new("injected failure"));
            }
            self.frames.lock().push(frame.to_vec());
            Ok(())
        }
    }

    /// Settable MET clock.
    #[derive(Default)]
    pub(crate) struct FakeClock {
        pub micros: AtomicU32,
        pub free_running: AtomicBool,
    }

    impl FakeClock {
        pub(crate) fn set_micros(&self, v: u32) {
            self.micros.store(v, Ordering::Relaxed);
        }
    }

    impl MetClock for FakeClock {
        fn met_subsecond_micros(&self) -> u32 {
            self.micros.load(Ordering::Relaxed)
        }

        fn is_free_running(&self) -> bool {
            self.free_running.load(Ordering::Relaxed)
        }
    }

    /// Records every re-arm request.
    pub(crate) struct FakeTimer {
        pub arms: Mutex<Vec<(Duration, Duration)>>,
        pub accuracy: Duration,
    }

    impl FakeTimer {
        pub(crate) fn precise() -> Self {
            Self {
                arms: Mutex::new(Vec::new()),
                accuracy: Duration::from_micros(100),
            }
        }

        pub(crate) fn coarse(accuracy: Duration) -> Self {
            Self {
                arms: Mutex::new(Vec::new()),
                accuracy,
            }
        }
    }

    impl SlotTimer for FakeTimer {
        fn accuracy(&self) -> Duration {
            self.accuracy
        }

        fn arm(&self, first: Duration, interval: Duration) {
            self.arms.lock().push((first, interval));
        }
    }

    /// Hook that counts invocations.
    #[derive(Default)]
    pub(crate) struct CountingHook(pub Arc<AtomicU32>);

    impl SyncSlotHook for CountingHook {
        fn process(&mut self) -> Result<(), HookError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    /// 4-slot test geometry: 250 ms slots, 2 activities, 4 messages.
    pub(crate) fn small_profile() -> FrameProfile {
        FrameProfile {
            slots: 4,
            activities_per_slot: 2,
            msg_entries: 4,
            max_lag_slots: 2,
            ..FrameProfile::default()
        }
    }

    pub(crate) struct Rig {
        pub sched: Scheduler,
        pub bus: Arc<FakeBus>,
        pub clock: Arc<FakeClock>,
        pub timer: Arc<FakeTimer>,
    }

    pub(crate) fn rig(profile: FrameProfile) -> Rig {
        rig_with_timer(profile, FakeTimer::precise())
    }

    pub(crate) fn rig_with_timer(profile: FrameProfile, timer: FakeTimer) -> Rig {
        let bus = Arc::new(FakeBus::default());
        let clock = Arc::new(FakeClock::default());
        let timer = Arc::new(timer);
        let sched = Scheduler::new(
            profile,
            Arc::clone(&bus) as Arc<dyn MessageBus>,
            Arc::clone(&clock) as Arc<dyn MetClock>,
            Arc::clone(&timer) as Arc<dyn SlotTimer>,
        )
        .unwrap();
        Rig {
            sched,
            bus,
            clock,
            timer,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
