/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Frame synchronization: reconciling the external 1 Hz pulse with the local
//! slot timer.
//!
//! Two asynchronous handlers mutate the [`FrameSync`] scalars and raise the
//! coalescing wake-up signal; the worker loop recomputes the current slot
//! from this state on every wake.  Neither handler allocates or blocks —
//! both are safe to run from a timer-service context.
//!
//! The synchronizer never trusts either source outright:
//!
//! * The local timer may be coarser than one slot period.  When it is, minor
//!   frames are synchronized to MET and the timer only paces wake-ups.
//! * The external pulse may be absent (fall back to the local timer after a
//!   bounded MET alignment search), jittery (tolerated inside a window at
//!   the end of the table), or persistently wrong (ignored after
//!   `max_noisy_major_frames` consecutive anomalies, until a status reset).

use std::time::Duration;

use tracing::debug;

use crate::profile::FrameProfile;

use super::Scheduler;

// ── Major frame source ────────────────────────────────────────────────────────

/// Where the major frame boundary currently comes from.
///
/// `None → MinorFrameTimer` on the first local-timer expiry with no pulse
/// seen; `* → ExternalPulse` on the first accepted pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MajorFrameSource {
    #[default]
    None,
    ExternalPulse,
    MinorFrameTimer,
}

impl MajorFrameSource {
    /// Stable integer form for the diagnostic packet.
    pub fn wire_value(self) -> u8 {
        match self {
            MajorFrameSource::None => 0,
            MajorFrameSource::ExternalPulse => 1,
            MajorFrameSource::MinorFrameTimer => 2,
        }
    }
}

// ── MET sync flags ────────────────────────────────────────────────────────────

/// Which parts of the schedule are synchronized to MET.
///
/// A named-field bitset: the combinations the synchronizer tests for are
/// expressed as accessors rather than mask arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetSync {
    minor: bool,
    major: bool,
    major_pending: bool,
}

impl MetSync {
    /// No MET synchronization at all — the minor-frame count is the only
    /// notion of the current slot.
    pub fn none(&self) -> bool {
        !(self.minor || self.major || self.major_pending)
    }

    pub fn any(&self) -> bool {
        !self.none()
    }

    /// Minor frames MET-synced, major frame not (and not pending) — the
    /// combination that widens the expected-pulse window.
    pub fn minor_only(&self) -> bool {
        self.minor && !self.major && !self.major_pending
    }

    pub fn minor(&self) -> bool {
        self.minor
    }

    pub fn major(&self) -> bool {
        self.major
    }

    pub fn major_pending(&self) -> bool {
        self.major_pending
    }

    pub(crate) fn set_minor(&mut self) {
        self.minor = true;
    }

    pub(crate) fn arm_major_pending(&mut self) {
        self.major_pending = true;
    }

    /// Alignment finished (or was abandoned): pending becomes major-synced.
    pub(crate) fn complete_major_sync(&mut self) {
        self.major_pending = false;
        self.major = true;
    }

    /// An accepted pulse owns the major frame again; MET keeps pacing minor
    /// frames if it already was.
    pub(crate) fn clear_major_keep_minor(&mut self) {
        self.major = false;
        self.major_pending = false;
    }

    /// Bit form for the diagnostic packet: minor = 1, major = 2, pending = 4.
    pub fn wire_bits(&self) -> u8 {
        u8::from(self.minor) | u8::from(self.major) << 1 | u8::from(self.major_pending) << 2
    }
}

// ── FrameSync ─────────────────────────────────────────────────────────────────

/// Synchronization state shared by the two asynchronous handlers and the
/// worker loop.
#[derive(Debug)]
pub(crate) struct FrameSync {
    pub(crate) source: MajorFrameSource,
    pub(crate) met: MetSync,

    /// Stop trusting the external pulse entirely.  Set after a sustained
    /// noise pattern; cleared only by a status reset.
    pub(crate) ignore_major_frame: bool,
    /// Telemetry flag: the most recent pulse arrived outside its window.
    pub(crate) unexpected_major_frame: bool,
    /// One-shot eligibility for the "now ignoring" notice.
    pub(crate) send_noisy_notice: bool,
    pub(crate) consecutive_noisy_frames: u32,

    /// Remaining local-timer expiries to spend hunting the MET second
    /// boundary.
    pub(crate) sync_attempts_left: u32,
    /// Slots elapsed since the last believed major frame.
    pub(crate) minor_frames_since_tone: u32,
    /// MET slot prevailing at the last pulse — the anchor for elapsed-slot
    /// deltas.
    pub(crate) last_sync_met_slot: u32,
}

impl FrameSync {
    pub(crate) fn new(profile: &FrameProfile) -> Self {
        Self {
            source: MajorFrameSource::None,
            met: MetSync::default(),
            ignore_major_frame: false,
            unexpected_major_frame: false,
            // assume the pulse is healthy and due any moment
            send_noisy_notice: true,
            consecutive_noisy_frames: 0,
            sync_attempts_left: 0,
            // start at the sync slot so the first pulse reads as expected
            minor_frames_since_tone: profile.time_sync_slot(),
            last_sync_met_slot: 0,
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

impl Scheduler {
    /// External 1 Hz pulse handler.
    ///
    /// Runs asynchronously to the worker loop; mutates only synchronization
    /// scalars and raises the wake-up signal.
    pub fn on_major_frame_pulse(&mut self) {
        debug!("major frame pulse");

        // A free-running time base makes the pulse meaningless
        if !self.clock.is_free_running() {
            // Without MET sync the pulse must land exactly in the sync slot;
            // with minor frames MET-synced, anywhere within the worst-case
            // window at the end of the table (or at slot zero) is fine.
            let window_floor = u32::from(self.profile.slots)
                .saturating_sub(self.worst_case_slots_per_minor_frame + 1);
            let noisy = (self.sync.met.none()
                && self.sync.minor_frames_since_tone != self.profile.time_sync_slot())
                || (self.sync.met.minor_only()
                    && self.next_slot != 0
                    && u32::from(self.next_slot) < window_floor);

            if noisy {
                self.sync.unexpected_major_frame = true;
                self.counters.unexpected_major_frames += 1;

                if !self.sync.ignore_major_frame {
                    self.sync.consecutive_noisy_frames += 1;
                    if self.sync.consecutive_noisy_frames >= self.profile.max_noisy_major_frames {
                        self.sync.ignore_major_frame = true;
                    }
                }
            } else {
                self.sync.unexpected_major_frame = false;
                self.sync.consecutive_noisy_frames = 0;
            }

            if !self.sync.ignore_major_frame {
                // Cancel any pending long slot and restore nominal cadence
                self.timer
                    .arm(self.profile.slot_period(), self.profile.slot_period());

                self.counters.valid_major_frames += 1;
                self.sync.minor_frames_since_tone = 0;
                self.sync.source = MajorFrameSource::ExternalPulse;
                self.sync.met.clear_major_keep_minor();

                self.wake.raise();
            }
        }

        // The next pulse is assumed to land in the same MET slot as this
        // one, even when it was ignored or the clock was free-running
        self.sync.last_sync_met_slot = self.met_slot();
    }

    /// Local slot-timer expiry handler.
    pub fn on_minor_frame_tick(&mut self) {
        // First expiry ever: the startup wait for a pulse timed out, so the
        // local timer owns the major frame and alignment to MET begins
        if self.sync.source == MajorFrameSource::None {
            self.sync.source = MajorFrameSource::MinorFrameTimer;
            self.sync.met.arm_major_pending();
            self.sync.sync_attempts_left = self.profile.max_sync_attempts;
            self.sync.last_sync_met_slot = 0;
        }

        if self.sync.met.major_pending() && self.sync.source == MajorFrameSource::MinorFrameTimer {
            // Keep nominal cadence while hunting the MET second boundary
            self.timer
                .arm(self.profile.slot_period(), self.profile.slot_period());
            self.sync.sync_attempts_left = self.sync.sync_attempts_left.saturating_sub(1);

            let current = self.met_slot();
            if current != 0 && self.sync.sync_attempts_left > 0 {
                // still searching — nothing to process yet
                return;
            }

            // Aligned, or out of attempts: the sampled slot is the best
            // estimate either way
            self.sync.met.complete_major_sync();
            self.sync.minor_frames_since_tone = current;
            self.sync.last_sync_met_slot = 0;
            debug!(slot = current, "minor frame timer aligned to MET");
        } else {
            self.sync.minor_frames_since_tone += 1;
        }

        if self.sync.minor_frames_since_tone >= u32::from(self.profile.slots) {
            // The long slot expired un-cancelled: no pulse arrived.  Arm a
            // short first interval to absorb the overrun.
            self.timer
                .arm(self.profile.short_slot_period(), self.profile.slot_period());
            self.sync.minor_frames_since_tone = 0;
            self.counters.missed_major_frames += 1;
        }

        if self.sync.minor_frames_since_tone == self.profile.time_sync_slot() {
            // Wide single-shot window for the pulse to arrive and preempt.
            // Any other slot leaves the cadence alone — re-arming every tick
            // would add software-response jitter.
            self.timer.arm(self.profile.sync_slot_period(), Duration::ZERO);
        }

        self.wake.raise();
    }

    // ── Slot derivation ───────────────────────────────────────────────────────

    /// The slot the worker should consider current.
    pub(crate) fn current_slot(&self) -> u32 {
        if self.sync.met.any() {
            let met = self.met_slot();
            // Adjust by the MET slot prevailing at the last pulse; with the
            // major frame itself MET-synced the anchor is zero and the MET
            // slot is already right
            if met < self.sync.last_sync_met_slot {
                met + u32::from(self.profile.slots) - self.sync.last_sync_met_slot
            } else {
                met - self.sync.last_sync_met_slot
            }
        } else {
            self.sync.minor_frames_since_tone
        }
    }

    /// The slot implied by the MET sub-second count.
    pub(crate) fn met_slot(&self) -> u32 {
        let micros = self.clock.met_subsecond_micros();
        let period = self.profile.slot_period_us();

        let mut slot = micros / period;

        // Within one microsecond of the boundary counts as the next slot
        let remainder = micros - slot * period + 1;
        slot += remainder / period;

        if slot == u32::from(self.profile.slots) {
            slot = 0;
        }
        slot
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
