/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the scheduler core.
//!
//! Two error layers mirror the two failure surfaces:
//!
//! * [`EntryFault`] (in [`crate::schtbl`]) — why a single schedule entry is
//!   self-inconsistent (low-level, carries the exact offending values).
//! * [`CommandError`] — top-level rejection returned from a command handler.
//!
//! Every variant carries enough structured data to emit a fully-qualified
//! `tracing` event without further parsing.  **Do not** replace these with
//! `anyhow::Error` in library paths — the structured variants are
//! intentional; `anyhow` stays in the config loader and `main`.

use thiserror::Error;

use crate::schtbl::EntryFault;

// ── Command rejections ────────────────────────────────────────────────────────

/// Top-level error returned by the scheduler command handlers.
///
/// A rejection mutates no state: the command fails, an error event is
/// emitted, and the tables and counters are untouched.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Slot coordinate outside the schedule table.
    #[error("slot {slot} out of range (max {max})")]
    InvalidSlot { slot: u16, max: u16 },

    /// Activity coordinate outside the slot's row.
    #[error("activity {activity} out of range (max {max})")]
    InvalidActivity { activity: u16, max: u16 },

    /// Message table index outside the message table.
    #[error("message index {index} out of range (max {max})")]
    InvalidMsgIndex { index: u16, max: u16 },

    /// The entry at (or destined for) `(slot, activity)` failed its
    /// self-consistency check.  Enabling an inconsistent entry could wedge
    /// dispatch, so the check runs before any mutation.
    #[error("entry at slot {slot} activity {activity} rejected: {fault}")]
    EntryRejected {
        slot: u16,
        activity: u16,
        fault: EntryFault,
    },

    /// A bulk table load whose dimensions do not match the deployment
    /// profile.
    #[error("table size mismatch: expected {expected} entries, got {actual}")]
    TableSizeMismatch { expected: usize, actual: usize },

    /// The message bus refused a diagnostic packet.
    #[error("telemetry transmit failed: {0}")]
    Bus(#[from] BusError),
}

// ── Collaborator failures ─────────────────────────────────────────────────────

/// Transmit failure reported by the [`MessageBus`] collaborator.
///
/// During dispatch this is recovered locally: the offending entry is
/// disabled and the failure counted.  It is never fatal and never retried.
///
/// [`MessageBus`]: crate::scheduler::MessageBus
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("message bus transmit failed: {detail}")]
pub struct BusError {
    pub detail: String,
}

impl BusError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Failure raised by the deferred ground-command hook.  The only error that
/// aborts a multi-slot catch-up early.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("sync-slot hook failed: {detail}")]
pub struct HookError {
    pub detail: String,
}

impl HookError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

// ── Startup failures ──────────────────────────────────────────────────────────

/// Failure while wiring the scheduler to its runtime.
///
/// Startup-fatal for the owning process: the scheduler is left partially
/// initialised and subsequent operation is undefined.  Reported with an
/// error event and returned to the caller, never recovered internally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    /// The runtime was already started — the slot timer task and worker
    /// loop exist exactly once per scheduler.
    #[error("scheduler runtime already started")]
    AlreadyStarted,
}
