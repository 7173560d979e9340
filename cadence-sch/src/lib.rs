/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cadence-SCH – table-driven activity scheduler (Rust port)
//!
//! Fires pre-built messages in fixed time slots, synchronized to an external
//! 1 Hz major-frame pulse while compensating for an imprecise local slot
//! timer.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── profile/    – deployment timing constants (FrameProfile)
//! ├── msgtbl/     – message table + packet header codec
//! ├── schtbl/     – schedule table (slot × activity grid)
//! ├── scheduler/  – frame synchronizer, slot engine, commands, telemetry
//! ├── runtime/    – tokio wiring: slot timer, wake signal, worker loop
//! └── config/     – YAML table-set loading
//! ```

pub mod config;
pub mod msgtbl;
pub mod profile;
pub mod runtime;
pub mod schtbl;
pub mod scheduler;
