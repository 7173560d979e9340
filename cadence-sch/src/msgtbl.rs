/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Message table: the pre-built outgoing packets the scheduler dispatches.
//!
//! Each [`MessageEntry`] is a fixed 64-byte buffer holding one fully-formed
//! packet **in wire byte order** — a CCSDS-style primary header, an optional
//! secondary header, and payload.  The buffer is the packet: dispatch
//! transmits the leading `total_length()` bytes verbatim, so no serialization
//! happens on the hot path.
//!
//! Header layout (all words big-endian):
//!
//! ```text
//! word 0   stream id      – version(3) | type(1) | sec-hdr flag(1) | apid(11)
//! word 1   sequence       – flags(2) | count(14)
//! word 2   length         – total packet bytes − 7
//! bytes 6… command secondary  (function code + checksum)        – 2 bytes
//!          telemetry secondary (seconds u32 + subseconds u16)   – 6 bytes
//! ```
//!
//! Entries are mutated only by explicit load operations and read during
//! dispatch; the table is allocated once and lives for the process lifetime.

use byteorder::{BigEndian, ByteOrder};

/// Fixed size of one message buffer in bytes.
pub const MSG_ENTRY_BYTES: usize = 64;

/// CCSDS-style primary header size.
pub const PRIMARY_HEADER_BYTES: usize = 6;

/// Primary header size in 16-bit words (the portion mirrored big-endian into
/// the entry-record telemetry packet).
pub const PRIMARY_HEADER_WORDS: usize = PRIMARY_HEADER_BYTES / 2;

/// Command packets carry a 2-byte secondary header (function code, checksum).
pub const CMD_HEADER_BYTES: usize = PRIMARY_HEADER_BYTES + 2;

/// Telemetry packets carry a 6-byte time secondary header.
pub const TLM_HEADER_BYTES: usize = PRIMARY_HEADER_BYTES + 6;

/// Stream-id bit distinguishing command from telemetry packets.
const TYPE_BIT: u16 = 0x1000;

/// Sequence word for a freshly initialised packet: both sequence flags set,
/// count zero.
const INITIAL_SEQUENCE: u16 = 0xC000;

// ── Message type ──────────────────────────────────────────────────────────────

/// Packet direction, decoded from the stream-id type bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    Command,
    Telemetry,
}

// ── MessageEntry ──────────────────────────────────────────────────────────────

/// One pre-built outgoing packet, stored in wire byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageEntry {
    bytes: [u8; MSG_ENTRY_BYTES],
}

impl Default for MessageEntry {
    fn default() -> Self {
        Self {
            bytes: [0; MSG_ENTRY_BYTES],
        }
    }
}

impl MessageEntry {
    /// Zero the buffer and write a fresh header for `msg_id`.
    ///
    /// The length field is set for a header-only packet of the appropriate
    /// type; loading a payload on top is the table manager's business.
    pub fn init(&mut self, msg_id: u16) {
        self.bytes = [0; MSG_ENTRY_BYTES];
        BigEndian::write_u16(&mut self.bytes[0..2], msg_id);
        BigEndian::write_u16(&mut self.bytes[2..4], INITIAL_SEQUENCE);
        let total = if msg_id & TYPE_BIT != 0 {
            CMD_HEADER_BYTES
        } else {
            TLM_HEADER_BYTES
        };
        BigEndian::write_u16(&mut self.bytes[4..6], (total - 7) as u16);
    }

    /// Construct an initialised entry in one step.
    pub fn with_msg_id(msg_id: u16) -> Self {
        let mut entry = Self::default();
        entry.init(msg_id);
        entry
    }

    /// The full stream id (first header word).
    pub fn msg_id(&self) -> u16 {
        BigEndian::read_u16(&self.bytes[0..2])
    }

    /// Application id portion of the stream id.
    pub fn apid(&self) -> u16 {
        self.msg_id() & 0x07FF
    }

    /// Command or telemetry, from the stream-id type bit.
    pub fn msg_type(&self) -> MsgType {
        if self.msg_id() & TYPE_BIT != 0 {
            MsgType::Command
        } else {
            MsgType::Telemetry
        }
    }

    /// Sequence count (low 14 bits of the sequence word).
    pub fn sequence_count(&self) -> u16 {
        BigEndian::read_u16(&self.bytes[2..4]) & 0x3FFF
    }

    /// Total packet length in bytes (length field + 7).
    pub fn total_length(&self) -> usize {
        usize::from(BigEndian::read_u16(&self.bytes[4..6])) + 7
    }

    /// Command function code (command secondary header, low 7 bits).
    pub fn function_code(&self) -> u8 {
        self.bytes[6] & 0x7F
    }

    /// Command checksum byte.
    pub fn checksum(&self) -> u8 {
        self.bytes[7]
    }

    /// Telemetry timestamp, seconds part.
    pub fn time_seconds(&self) -> u32 {
        BigEndian::read_u32(&self.bytes[6..10])
    }

    /// Telemetry timestamp, subseconds part.
    pub fn time_subseconds(&self) -> u16 {
        BigEndian::read_u16(&self.bytes[10..12])
    }

    /// Byte offset where payload starts for this packet's type.
    pub fn payload_offset(&self) -> usize {
        match self.msg_type() {
            MsgType::Command => CMD_HEADER_BYTES,
            MsgType::Telemetry => TLM_HEADER_BYTES,
        }
    }

    /// Read the `i`-th 16-bit payload word, if it fits in the buffer.
    pub fn payload_word(&self, i: usize) -> Option<u16> {
        let at = self.payload_offset() + i * 2;
        if at + 2 > MSG_ENTRY_BYTES {
            return None;
        }
        Some(BigEndian::read_u16(&self.bytes[at..at + 2]))
    }

    /// Read the `i`-th 16-bit word of the raw buffer (header included).
    pub fn word(&self, i: usize) -> u16 {
        BigEndian::read_u16(&self.bytes[i * 2..i * 2 + 2])
    }

    /// The transmittable byte slice, or `None` when the encoded length does
    /// not fit the buffer.  A `None` here is a dispatch failure: the entry
    /// that referenced this message gets disabled.
    pub fn wire_frame(&self) -> Option<&[u8]> {
        let total = self.total_length();
        if total > MSG_ENTRY_BYTES {
            return None;
        }
        Some(&self.bytes[..total])
    }

    /// Raw buffer access, used when mirroring the entry into telemetry.
    pub fn raw(&self) -> &[u8; MSG_ENTRY_BYTES] {
        &self.bytes
    }

    /// Overwrite the raw buffer.  No validation — the caller owns the wire
    /// format.
    pub fn load_raw(&mut self, bytes: [u8; MSG_ENTRY_BYTES]) {
        self.bytes = bytes;
    }
}

// ── MsgTable ──────────────────────────────────────────────────────────────────

/// The message table: a fixed-length array of [`MessageEntry`] allocated
/// once at construction.
#[derive(Debug, Clone)]
pub struct MsgTable {
    entries: Vec<MessageEntry>,
}

impl MsgTable {
    /// Allocate `len` zeroed entries.
    pub fn new(len: u16) -> Self {
        Self {
            entries: vec![MessageEntry::default(); usize::from(len)],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounds-checked read access.
    pub fn entry(&self, index: u16) -> Option<&MessageEntry> {
        self.entries.get(usize::from(index))
    }

    /// Bounds-checked write access.
    pub fn entry_mut(&mut self, index: u16) -> Option<&mut MessageEntry> {
        self.entries.get_mut(usize::from(index))
    }

    /// Replace the whole table in place.  Lengths must already match — the
    /// scheduler's load operation checks this at its API boundary.
    pub fn overwrite(&mut self, other: &MsgTable) {
        self.entries.copy_from_slice(&other.entries);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_command_header_round_trips() {
        let e = MessageEntry::with_msg_id(0x1881);
        assert_eq!(e.msg_id(), 0x1881);
        assert_eq!(e.apid(), 0x081);
        assert_eq!(e.msg_type(), MsgType::Command);
        assert_eq!(e.sequence_count(), 0);
        assert_eq!(e.total_length(), CMD_HEADER_BYTES);
        assert_eq!(e.function_code(), 0);
    }

    #[test]
    fn init_telemetry_header_round_trips() {
        let e = MessageEntry::with_msg_id(0x0891);
        assert_eq!(e.msg_type(), MsgType::Telemetry);
        assert_eq!(e.total_length(), TLM_HEADER_BYTES);
        assert_eq!(e.time_seconds(), 0);
        assert_eq!(e.time_subseconds(), 0);
    }

    #[test]
    fn header_bytes_are_big_endian_on_the_wire() {
        let e = MessageEntry::with_msg_id(0x1881);
        assert_eq!(e.raw()[0], 0x18);
        assert_eq!(e.raw()[1], 0x81);
        assert_eq!(e.raw()[2], 0xC0);
        assert_eq!(e.raw()[3], 0x00);
    }

    #[test]
    fn wire_frame_spans_total_length() {
        let e = MessageEntry::with_msg_id(0x1881);
        assert_eq!(e.wire_frame().unwrap().len(), CMD_HEADER_BYTES);
    }

    #[test]
    fn oversize_length_field_yields_no_frame() {
        let mut e = MessageEntry::default();
        let mut raw = [0u8; MSG_ENTRY_BYTES];
        // length field claims 200 + 7 bytes — beyond the 64-byte buffer
        raw[4] = 0;
        raw[5] = 200;
        e.load_raw(raw);
        assert!(e.wire_frame().is_none());
    }

    #[test]
    fn payload_words_read_past_the_secondary_header() {
        let mut e = MessageEntry::with_msg_id(0x1881);
        let mut raw = *e.raw();
        raw[CMD_HEADER_BYTES] = 0xAB;
        raw[CMD_HEADER_BYTES + 1] = 0xCD;
        e.load_raw(raw);
        assert_eq!(e.payload_word(0), Some(0xABCD));
        // the last word that fits
        assert!(e.payload_word((MSG_ENTRY_BYTES - CMD_HEADER_BYTES) / 2 - 1).is_some());
        assert_eq!(e.payload_word((MSG_ENTRY_BYTES - CMD_HEADER_BYTES) / 2), None);
    }

    #[test]
    fn table_is_bounds_checked() {
        let mut tbl = MsgTable::new(4);
        assert!(tbl.entry(3).is_some());
        assert!(tbl.entry(4).is_none());
        assert!(tbl.entry_mut(4).is_none());
    }

    #[test]
    fn overwrite_replaces_contents() {
        let mut a = MsgTable::new(2);
        let mut b = MsgTable::new(2);
        b.entry_mut(1).unwrap().init(0x1881);
        a.overwrite(&b);
        assert_eq!(a.entry(1).unwrap().msg_id(), 0x1881);
    }
}
