/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Deployment timing profile.
//!
//! [`FrameProfile`] collects the constants that define one deployment of the
//! scheduler: table geometry, catch-up limits, and the timer periods derived
//! from them.  The values are grouped in a validated struct rather than
//! scattered compile-time constants so that test builds can run against a
//! small table (e.g. 4 slots) while the flight configuration keeps the full
//! one — the tables themselves are still allocated exactly once, at
//! construction.
//!
//! One major frame is always one second; the slot period is derived as
//! `1 s / slots` and the profile is rejected if that division is not exact.

use std::time::Duration;

use thiserror::Error;

/// One second, in microseconds.  The major frame period.
pub const MAJOR_FRAME_PERIOD_US: u32 = 1_000_000;

// ── Error type ────────────────────────────────────────────────────────────────

/// Why a [`FrameProfile`] was rejected at construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    /// Fewer than two slots cannot express a schedule (the last slot is
    /// reserved for time synchronization).
    #[error("profile requires at least 2 slots, got {0}")]
    TooFewSlots(u16),

    /// The slot count must divide the major frame evenly, otherwise the MET
    /// slot arithmetic would accumulate a fractional-microsecond drift every
    /// second.
    #[error("{slots} slots do not divide the 1 s major frame evenly")]
    UnevenSlotPeriod { slots: u16 },

    /// A slot with no activity entries is unrepresentable.
    #[error("activities_per_slot must be >= 1")]
    NoActivities,

    /// An empty message table leaves nothing for an entry to reference.
    #[error("msg_entries must be >= 1")]
    NoMessageEntries,

    /// Zero slots per wakeup would stall the worker forever.
    #[error("max_slots_per_wakeup must be >= 1")]
    NoSlotsPerWakeup,

    /// The lag threshold must leave room for at least one skipped slot.
    #[error("max_lag_slots must be >= 1")]
    NoLagBudget,
}

// ── FrameProfile ──────────────────────────────────────────────────────────────

/// Constants of one scheduler deployment.
///
/// The defaults describe the nominal configuration: a 1 s major frame cut
/// into 100 slots of 10 ms, 8 activities per slot, and a 32-entry message
/// table.
#[derive(Debug, Clone)]
pub struct FrameProfile {
    /// Number of schedule slots per major frame (table length).
    pub slots: u16,

    /// Activity entries per slot.
    pub activities_per_slot: u16,

    /// Message table length.
    pub msg_entries: u16,

    /// Slots of lag beyond which the worker stops catching up and jumps
    /// straight to the current slot.
    pub max_lag_slots: u32,

    /// Catch-up ceiling: the worker never dispatches more than this many
    /// slots on a single wake-up.
    pub max_slots_per_wakeup: u32,

    /// Bounded number of local-timer expiries spent searching for the MET
    /// second boundary when falling back to the local timer.
    pub max_sync_attempts: u32,

    /// Consecutive noisy major-frame pulses tolerated before the external
    /// source is ignored entirely.
    pub max_noisy_major_frames: u32,

    /// Worst acceptable local-timer accuracy before minor frames must be
    /// synchronized to MET, in microseconds.
    pub worst_clock_accuracy_us: u32,

    /// Extended first timer interval armed at startup, giving the external
    /// pulse a chance to arrive before the local timer takes over.
    pub startup_delay: Duration,
}

impl Default for FrameProfile {
    fn default() -> Self {
        Self {
            slots: 100,
            activities_per_slot: 8,
            msg_entries: 32,
            max_lag_slots: 50,
            max_slots_per_wakeup: 5,
            max_sync_attempts: 4,
            max_noisy_major_frames: 2,
            worst_clock_accuracy_us: 1_000,
            startup_delay: Duration::from_secs(5),
        }
    }
}

impl FrameProfile {
    /// Check the profile for internal consistency.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.slots < 2 {
            return Err(ProfileError::TooFewSlots(self.slots));
        }
        if MAJOR_FRAME_PERIOD_US % u32::from(self.slots) != 0 {
            return Err(ProfileError::UnevenSlotPeriod { slots: self.slots });
        }
        if self.activities_per_slot == 0 {
            return Err(ProfileError::NoActivities);
        }
        if self.msg_entries == 0 {
            return Err(ProfileError::NoMessageEntries);
        }
        if self.max_slots_per_wakeup == 0 {
            return Err(ProfileError::NoSlotsPerWakeup);
        }
        if self.max_lag_slots == 0 {
            return Err(ProfileError::NoLagBudget);
        }
        Ok(())
    }

    /// Nominal slot period in microseconds (`1 s / slots`).
    pub fn slot_period_us(&self) -> u32 {
        MAJOR_FRAME_PERIOD_US / u32::from(self.slots)
    }

    /// Nominal slot period as a [`Duration`].
    pub fn slot_period(&self) -> Duration {
        Duration::from_micros(u64::from(self.slot_period_us()))
    }

    /// Extended single-shot period armed in the time-sync slot so the
    /// external pulse has a wide window to arrive and cancel it (150 % of
    /// nominal).
    pub fn sync_slot_period(&self) -> Duration {
        Duration::from_micros(u64::from(self.slot_period_us()) * 3 / 2)
    }

    /// Shortened first interval used to absorb the overrun after a missed
    /// major frame (50 % of nominal).
    pub fn short_slot_period(&self) -> Duration {
        Duration::from_micros(u64::from(self.slot_period_us()) / 2)
    }

    /// The slot reserved for time synchronization — always the last slot
    /// before wraparound.
    pub fn time_sync_slot(&self) -> u32 {
        u32::from(self.slots) - 1
    }

    /// Total schedule table entries (`slots × activities_per_slot`).
    pub fn total_entries(&self) -> usize {
        usize::from(self.slots) * usize::from(self.activities_per_slot)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
