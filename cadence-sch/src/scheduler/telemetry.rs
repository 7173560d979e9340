/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Diagnostic and entry-record telemetry packets.
//!
//! Both packets are CCSDS-style telemetry frames: a big-endian primary
//! header, a zeroed 6-byte time secondary header (stamping is the downlink
//! collaborator's business), and a big-endian field block.
//!
//! The entry-record packet mirrors one message table entry.  Only the
//! mirrored entry's 3 primary-header words and its payload are copied —
//! the secondary-header region (command function code / telemetry time) is
//! zeroed in the mirror.  The working copy is already in wire byte order, so
//! the mirrored header words are big-endian on the wire by construction.

use byteorder::{BigEndian, ByteOrder};
use tracing::error;

use crate::msgtbl::{MessageEntry, MSG_ENTRY_BYTES, PRIMARY_HEADER_BYTES};
use crate::schtbl::ScheduleEntry;

use super::error::CommandError;
use super::sync::{MajorFrameSource, MetSync};
use super::{Scheduler, StatCounters};

/// Stream id of the entry-record packet.
pub const ENTRY_RECORD_MSG_ID: u16 = 0x08A1;

/// Stream id of the diagnostic packet.
pub const DIAG_MSG_ID: u16 = 0x08A2;

/// Sentinel for "no schedule entry cross-references this message".
pub const UNDEFINED_FIELD: u16 = 0xFFFF;

/// Telemetry header size: primary header + zeroed time secondary.
const TLM_HEADER_BYTES: usize = PRIMARY_HEADER_BYTES + 6;

// ── Encoding helpers ──────────────────────────────────────────────────────────

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    let mut w = [0u8; 2];
    BigEndian::write_u16(&mut w, v);
    buf.extend_from_slice(&w);
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    let mut w = [0u8; 4];
    BigEndian::write_u32(&mut w, v);
    buf.extend_from_slice(&w);
}

/// Telemetry primary header + zeroed time secondary for `msg_id`, with the
/// CCSDS length field covering `payload_len` more bytes.
fn tlm_header(buf: &mut Vec<u8>, msg_id: u16, payload_len: usize) {
    put_u16(buf, msg_id);
    put_u16(buf, 0xC000);
    put_u16(buf, (TLM_HEADER_BYTES + payload_len - 7) as u16);
    buf.extend_from_slice(&[0u8; 6]);
}

/// Mirror a message entry for telemetry: primary header words and payload
/// copied, secondary-header region zeroed.
fn mirror_message(msg: &MessageEntry) -> [u8; MSG_ENTRY_BYTES] {
    let mut out = [0u8; MSG_ENTRY_BYTES];
    out[..PRIMARY_HEADER_BYTES].copy_from_slice(&msg.raw()[..PRIMARY_HEADER_BYTES]);
    let off = msg.payload_offset();
    out[off..].copy_from_slice(&msg.raw()[off..]);
    out
}

// ── EntryRecordPacket ─────────────────────────────────────────────────────────

/// One schedule entry plus a mirror of the message it references.
///
/// When no schedule entry cross-references the message, `slot`, `activity`
/// and the entry fields carry [`UNDEFINED_FIELD`].
///
/// Field block layout (big-endian words after the telemetry header):
/// `slot, activity, enabled, period, offset, msg_index`, then the 64-byte
/// message mirror.
#[derive(Debug, Clone)]
pub struct EntryRecordPacket {
    pub slot: u16,
    pub activity: u16,
    pub entry: ScheduleEntry,
    pub mirror: [u8; MSG_ENTRY_BYTES],
}

impl EntryRecordPacket {
    pub fn encode(&self) -> Vec<u8> {
        let payload_len = 12 + MSG_ENTRY_BYTES;
        let mut buf = Vec::with_capacity(TLM_HEADER_BYTES + payload_len);
        tlm_header(&mut buf, ENTRY_RECORD_MSG_ID, payload_len);
        put_u16(&mut buf, self.slot);
        put_u16(&mut buf, self.activity);
        put_u16(&mut buf, u16::from(self.entry.enabled));
        put_u16(&mut buf, self.entry.period);
        put_u16(&mut buf, self.entry.offset);
        put_u16(&mut buf, self.entry.msg_index);
        buf.extend_from_slice(&self.mirror);
        buf
    }
}

// ── DiagPacket ────────────────────────────────────────────────────────────────

/// Bounded snapshot of the scheduler's live state: counters, sync/timer
/// state, and one full slot's activity row.
///
/// Field block layout (big-endian after the telemetry header):
/// `last_process_count u32, clock_accuracy_us u32, worst_case u32,
/// ignore u8, met_bits u8, source u8, spare u8, next_slot u16, slot u16,
/// table_pass_count u32, minor_frames_since_tone u32, last_sync_met_slot
/// u32`, the nine counters as `u32`, then `activities_per_slot` entries of
/// four words each.
#[derive(Debug, Clone)]
pub struct DiagPacket {
    pub last_process_count: u32,
    pub clock_accuracy_us: u32,
    pub worst_case_slots_per_minor_frame: u32,
    pub ignore_major_frame: bool,
    pub met_sync: MetSync,
    pub major_frame_source: MajorFrameSource,
    pub next_slot: u16,
    pub table_pass_count: u32,
    pub minor_frames_since_tone: u32,
    pub last_sync_met_slot: u32,
    pub counters: StatCounters,
    pub slot: u16,
    pub row: Vec<ScheduleEntry>,
}

impl DiagPacket {
    pub fn encode(&self) -> Vec<u8> {
        let payload_len = 12 + 4 + 2 + 2 + 12 + 9 * 4 + self.row.len() * 8;
        let mut buf = Vec::with_capacity(TLM_HEADER_BYTES + payload_len);
        tlm_header(&mut buf, DIAG_MSG_ID, payload_len);

        put_u32(&mut buf, self.last_process_count);
        put_u32(&mut buf, self.clock_accuracy_us);
        put_u32(&mut buf, self.worst_case_slots_per_minor_frame);
        buf.push(u8::from(self.ignore_major_frame));
        buf.push(self.met_sync.wire_bits());
        buf.push(self.major_frame_source.wire_value());
        buf.push(0); // spare
        put_u16(&mut buf, self.next_slot);
        put_u16(&mut buf, self.slot);
        put_u32(&mut buf, self.table_pass_count);
        put_u32(&mut buf, self.minor_frames_since_tone);
        put_u32(&mut buf, self.last_sync_met_slot);

        let c = &self.counters;
        for v in [
            c.slots_processed,
            c.slots_skipped,
            c.multi_slot_events,
            c.same_slot_events,
            c.activity_success,
            c.activity_failure,
            c.valid_major_frames,
            c.missed_major_frames,
            c.unexpected_major_frames,
        ] {
            put_u32(&mut buf, v);
        }

        for e in &self.row {
            put_u16(&mut buf, u16::from(e.enabled));
            put_u16(&mut buf, e.period);
            put_u16(&mut buf, e.offset);
            put_u16(&mut buf, e.msg_index);
        }
        buf
    }
}

// ── Scheduler telemetry surface ───────────────────────────────────────────────

impl Scheduler {
    /// Snapshot the live state and one slot's activity row.
    pub fn diagnostics(&self, slot: u16) -> Result<DiagPacket, CommandError> {
        let Some(row) = self.sch_tbl.slot_row(slot) else {
            error!(
                slot,
                max = self.profile.slots - 1,
                "send diagnostic tlm cmd rejected"
            );
            return Err(CommandError::InvalidSlot {
                slot,
                max: self.profile.slots - 1,
            });
        };

        Ok(DiagPacket {
            last_process_count: self.last_process_count,
            clock_accuracy_us: self.clock_accuracy.as_micros().min(u128::from(u32::MAX)) as u32,
            worst_case_slots_per_minor_frame: self.worst_case_slots_per_minor_frame,
            ignore_major_frame: self.sync.ignore_major_frame,
            met_sync: self.sync.met,
            major_frame_source: self.sync.source,
            next_slot: self.next_slot,
            table_pass_count: self.table_pass_count,
            minor_frames_since_tone: self.sync.minor_frames_since_tone,
            last_sync_met_slot: self.sync.last_sync_met_slot,
            counters: self.counters,
            slot,
            row: row.to_vec(),
        })
    }

    /// Emit the diagnostic packet for `slot`.
    pub fn send_diagnostic_packet(&self, slot: u16) -> Result<(), CommandError> {
        let packet = self.diagnostics(slot)?;
        self.bus.transmit(&packet.encode())?;
        Ok(())
    }

    /// Emit an entry-record packet for `msg_index`, labelled with the given
    /// schedule coordinates (or the undefined sentinel when none
    /// cross-reference it).
    pub(crate) fn send_entry_record(
        &self,
        sch_ref: Option<(u16, u16)>,
        msg_index: u16,
    ) -> Result<(), CommandError> {
        let (slot, activity, entry) = match sch_ref {
            Some((slot, activity)) => (
                slot,
                activity,
                self.sch_tbl.entry(slot, activity).copied().unwrap_or_default(),
            ),
            None => (
                UNDEFINED_FIELD,
                UNDEFINED_FIELD,
                ScheduleEntry {
                    enabled: false,
                    period: UNDEFINED_FIELD,
                    offset: UNDEFINED_FIELD,
                    msg_index: UNDEFINED_FIELD,
                },
            ),
        };

        // An out-of-range reference mirrors as all zeros
        let mirror = match self.msg_tbl.entry(msg_index) {
            Some(msg) => mirror_message(msg),
            None => [0u8; MSG_ENTRY_BYTES],
        };

        let packet = EntryRecordPacket {
            slot,
            activity,
            entry,
            mirror,
        };
        self.bus.transmit(&packet.encode())?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::testkit::*;
    use super::*;
    use crate::msgtbl::CMD_HEADER_BYTES;
    use crate::schtbl::ScheduleEntry;

    fn body_offset() -> usize {
        TLM_HEADER_BYTES
    }

    #[test]
    fn send_entry_emits_record_with_mirrored_header() {
        let mut r = rig(small_profile());
        r.sched.load_msg_entry(2, 0x1881).unwrap();

        // give the message a payload word and a function code
        let mut raw = *r.sched.msg_table().entry(2).unwrap().raw();
        raw[6] = 0x42; // function code — must NOT survive the mirror
        raw[CMD_HEADER_BYTES] = 0xBE;
        raw[CMD_HEADER_BYTES + 1] = 0xEF;
        let mut msg = *r.sched.msg_table().entry(2).unwrap();
        msg.load_raw(raw);
        r.sched.load_msg_entry_raw(2, &msg).unwrap();

        r.sched
            .load_entry(
                1,
                0,
                ScheduleEntry {
                    enabled: true,
                    period: 2,
                    offset: 1,
                    msg_index: 2,
                },
            )
            .unwrap();

        r.sched.send_entry(1, 0).unwrap();

        let frames = r.bus.frames.lock();
        let pkt = frames.last().unwrap();
        assert_eq!(pkt[0], 0x08);
        assert_eq!(pkt[1], 0xA1);

        let body = body_offset();
        // slot, activity, enabled, period, offset, msg_index
        assert_eq!(&pkt[body..body + 12], &[0, 1, 0, 0, 0, 1, 0, 2, 0, 1, 0, 2]);

        let mirror = body + 12;
        // primary header words big-endian on the wire
        assert_eq!(pkt[mirror], 0x18);
        assert_eq!(pkt[mirror + 1], 0x81);
        // secondary header zeroed in the mirror
        assert_eq!(pkt[mirror + 6], 0x00);
        // payload preserved
        assert_eq!(pkt[mirror + CMD_HEADER_BYTES], 0xBE);
        assert_eq!(pkt[mirror + CMD_HEADER_BYTES + 1], 0xEF);
    }

    #[test]
    fn unreferenced_message_reports_the_undefined_sentinel() {
        let mut r = rig(small_profile());
        r.sched.load_msg_entry(2, 0x0891).unwrap();
        // the zeroed schedule table references index 0 everywhere, never 2
        r.sched.send_msg_entry(2).unwrap();

        let frames = r.bus.frames.lock();
        let pkt = frames.last().unwrap();
        let body = body_offset();
        assert_eq!(&pkt[body..body + 4], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn referenced_message_reports_the_first_matching_entry() {
        let mut r = rig(small_profile());
        r.sched.load_msg_entry(3, 0x0891).unwrap();
        r.sched
            .load_entry(
                2,
                1,
                ScheduleEntry {
                    enabled: true,
                    period: 1,
                    offset: 0,
                    msg_index: 3,
                },
            )
            .unwrap();

        r.sched.send_msg_entry(3).unwrap();

        let frames = r.bus.frames.lock();
        let pkt = frames.last().unwrap();
        let body = body_offset();
        assert_eq!(&pkt[body..body + 4], &[0, 2, 0, 1]);
    }

    #[test]
    fn diagnostics_snapshot_carries_the_requested_row() {
        let mut r = rig(small_profile());
        r.sched
            .load_entry(
                1,
                1,
                ScheduleEntry {
                    enabled: true,
                    period: 4,
                    offset: 3,
                    msg_index: 0,
                },
            )
            .unwrap();

        let diag = r.sched.diagnostics(1).unwrap();
        assert_eq!(diag.slot, 1);
        assert_eq!(diag.row.len(), 2);
        assert_eq!(diag.row[1].period, 4);
        assert_eq!(diag.major_frame_source, MajorFrameSource::None);
        assert!(!diag.ignore_major_frame);
    }

    #[test]
    fn diagnostics_rejects_out_of_range_slot() {
        let r = rig(small_profile());
        assert!(matches!(
            r.sched.diagnostics(4),
            Err(CommandError::InvalidSlot { slot: 4, max: 3 })
        ));
        // rejected command sends nothing
        assert!(r.bus.frames.lock().is_empty());
    }

    #[test]
    fn diag_packet_encodes_to_its_declared_length() {
        let r = rig(small_profile());
        let diag = r.sched.diagnostics(0).unwrap();
        let frame = diag.encode();
        assert_eq!(frame[0], 0x08);
        assert_eq!(frame[1], 0xA2);
        let declared = usize::from(u16::from_be_bytes([frame[4], frame[5]])) + 7;
        assert_eq!(declared, frame.len());
    }

    #[test]
    fn entry_record_encodes_to_its_declared_length() {
        let pkt = EntryRecordPacket {
            slot: 0,
            activity: 0,
            entry: ScheduleEntry::default(),
            mirror: [0; MSG_ENTRY_BYTES],
        };
        let frame = pkt.encode();
        let declared = usize::from(u16::from_be_bytes([frame[4], frame[5]])) + 7;
        assert_eq!(declared, frame.len());
    }
}
