/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedule table: the slot × activity grid that drives dispatch.
//!
//! The table is a flattened `Vec<ScheduleEntry>` of `slots ×
//! activities_per_slot` length, allocated once.  All 2D indexing goes through
//! bounds-checked accessors at the API boundary; the slot engine walks whole
//! rows by flat index.
//!
//! An *enabled* entry must be self-consistent (`period ≥ 1`, `offset <
//! period`, message index in range).  Violations are load-time rejections
//! ([`EntryFault`]), never runtime faults — the engine only ever sees entries
//! that passed the check or arrived through the unvalidated table-manager
//! path, and the latter is covered by the dispatch failure handling.

use thiserror::Error;

// ── Entry validation ──────────────────────────────────────────────────────────

/// Why a schedule entry failed its self-consistency check.
///
/// Carried inside [`CommandError::EntryRejected`] so the caller always knows
/// both *which* entry failed and *why*.
///
/// [`CommandError::EntryRejected`]: crate::scheduler::error::CommandError::EntryRejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EntryFault {
    /// `period == 0` — the pass-counter modulus would be undefined.
    #[error("period must be >= 1")]
    ZeroPeriod,

    /// `offset >= period` — the activity would never come due.
    #[error("offset {offset} must be < period {period}")]
    OffsetNotBelowPeriod { offset: u16, period: u16 },

    /// The referenced message index is outside the message table.
    #[error("message index {index} out of range (max {max})")]
    MsgIndexOutOfRange { index: u16, max: u16 },
}

// ── ScheduleEntry ─────────────────────────────────────────────────────────────

/// One activity: fire the referenced message on table passes where
/// `pass % period == offset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub enabled: bool,
    pub period: u16,
    pub offset: u16,
    pub msg_index: u16,
}

impl ScheduleEntry {
    /// Self-consistency check against a message table of `msg_entries`
    /// length.
    pub fn check(&self, msg_entries: u16) -> Result<(), EntryFault> {
        if self.period == 0 {
            return Err(EntryFault::ZeroPeriod);
        }
        if self.offset >= self.period {
            return Err(EntryFault::OffsetNotBelowPeriod {
                offset: self.offset,
                period: self.period,
            });
        }
        if self.msg_index >= msg_entries {
            return Err(EntryFault::MsgIndexOutOfRange {
                index: self.msg_index,
                max: msg_entries - 1,
            });
        }
        Ok(())
    }
}

// ── SchTable ──────────────────────────────────────────────────────────────────

/// The schedule table.
#[derive(Debug, Clone)]
pub struct SchTable {
    slots: u16,
    activities_per_slot: u16,
    entries: Vec<ScheduleEntry>,
}

impl SchTable {
    /// Allocate a zeroed (all-disabled) table.
    pub fn new(slots: u16, activities_per_slot: u16) -> Self {
        Self {
            slots,
            activities_per_slot,
            entries: vec![
                ScheduleEntry::default();
                usize::from(slots) * usize::from(activities_per_slot)
            ],
        }
    }

    pub fn slots(&self) -> u16 {
        self.slots
    }

    pub fn activities_per_slot(&self) -> u16 {
        self.activities_per_slot
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten `(slot, activity)` to a table index, or `None` when either
    /// coordinate is out of range.
    pub fn index(&self, slot: u16, activity: u16) -> Option<usize> {
        if slot >= self.slots || activity >= self.activities_per_slot {
            return None;
        }
        Some(usize::from(slot) * usize::from(self.activities_per_slot) + usize::from(activity))
    }

    pub fn entry(&self, slot: u16, activity: u16) -> Option<&ScheduleEntry> {
        self.index(slot, activity).map(|i| &self.entries[i])
    }

    pub fn entry_mut(&mut self, slot: u16, activity: u16) -> Option<&mut ScheduleEntry> {
        self.index(slot, activity).map(move |i| &mut self.entries[i])
    }

    /// Read by flat index.
    pub fn entry_flat(&self, index: usize) -> Option<&ScheduleEntry> {
        self.entries.get(index)
    }

    /// Write by flat index.
    pub fn entry_flat_mut(&mut self, index: usize) -> Option<&mut ScheduleEntry> {
        self.entries.get_mut(index)
    }

    /// One slot's full activity row.
    pub fn slot_row(&self, slot: u16) -> Option<&[ScheduleEntry]> {
        if slot >= self.slots {
            return None;
        }
        let start = usize::from(slot) * usize::from(self.activities_per_slot);
        Some(&self.entries[start..start + usize::from(self.activities_per_slot)])
    }

    /// First entry (ascending flat index) referencing `msg_index`, as
    /// `(slot, activity)`.  First match only — the reference is not
    /// guaranteed unique.
    pub fn find_msg_ref(&self, msg_index: u16) -> Option<(u16, u16)> {
        self.entries
            .iter()
            .position(|e| e.msg_index == msg_index)
            .map(|i| {
                (
                    (i / usize::from(self.activities_per_slot)) as u16,
                    (i % usize::from(self.activities_per_slot)) as u16,
                )
            })
    }

    /// Replace the whole table in place.  Dimensions must already match —
    /// the scheduler's load operation checks this at its API boundary.
    pub fn overwrite(&mut self, other: &SchTable) {
        self.entries.copy_from_slice(&other.entries);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(period: u16, offset: u16, msg_index: u16) -> ScheduleEntry {
        ScheduleEntry {
            enabled: true,
            period,
            offset,
            msg_index,
        }
    }

    // ── check ─────────────────────────────────────────────────────────────────

    #[test]
    fn valid_entry_passes_check() {
        assert_eq!(entry(4, 3, 0).check(8), Ok(()));
    }

    #[test]
    fn zero_period_is_rejected() {
        assert_eq!(entry(0, 0, 0).check(8), Err(EntryFault::ZeroPeriod));
    }

    #[test]
    fn offset_at_period_is_rejected() {
        assert_eq!(
            entry(4, 4, 0).check(8),
            Err(EntryFault::OffsetNotBelowPeriod {
                offset: 4,
                period: 4
            })
        );
    }

    #[test]
    fn out_of_range_msg_index_is_rejected() {
        assert_eq!(
            entry(1, 0, 8).check(8),
            Err(EntryFault::MsgIndexOutOfRange { index: 8, max: 7 })
        );
    }

    // ── indexing ──────────────────────────────────────────────────────────────

    #[test]
    fn index_flattens_row_major() {
        let tbl = SchTable::new(4, 8);
        assert_eq!(tbl.index(0, 0), Some(0));
        assert_eq!(tbl.index(0, 7), Some(7));
        assert_eq!(tbl.index(1, 0), Some(8));
        assert_eq!(tbl.index(3, 7), Some(31));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let tbl = SchTable::new(4, 8);
        assert_eq!(tbl.index(4, 0), None);
        assert_eq!(tbl.index(0, 8), None);
        assert!(tbl.entry(4, 0).is_none());
        assert!(tbl.slot_row(4).is_none());
    }

    #[test]
    fn load_then_read_returns_loaded_values() {
        let mut tbl = SchTable::new(4, 8);
        let e = entry(2, 1, 5);
        *tbl.entry_mut(2, 3).unwrap() = e;
        assert_eq!(*tbl.entry(2, 3).unwrap(), e);
        assert_eq!(tbl.slot_row(2).unwrap()[3], e);
    }

    // ── find_msg_ref ──────────────────────────────────────────────────────────

    #[test]
    fn find_msg_ref_returns_first_match_ascending() {
        let mut tbl = SchTable::new(4, 2);
        *tbl.entry_mut(1, 1).unwrap() = entry(1, 0, 7);
        *tbl.entry_mut(3, 0).unwrap() = entry(1, 0, 7);
        assert_eq!(tbl.find_msg_ref(7), Some((1, 1)));
    }

    #[test]
    fn find_msg_ref_matches_index_zero_everywhere() {
        // a zeroed table references message 0 from entry (0, 0)
        let tbl = SchTable::new(4, 2);
        assert_eq!(tbl.find_msg_ref(0), Some((0, 0)));
        assert_eq!(tbl.find_msg_ref(9), None);
    }
}
