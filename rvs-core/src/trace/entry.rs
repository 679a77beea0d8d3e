//! Trace entries and their wire layout
//!
//! A trace entry is one ipoint hit: the ipoint id and the 32-bit timestamp
//! taken when it was stored. On the wire (download destinations and trace
//! files) each entry is exactly [`ENTRY_SIZE`] bytes: the id, then the
//! timestamp, both native-endian `u32`, with no padding or framing.

use serde::{Deserialize, Serialize};

/// Size in bytes of one record in a download destination or trace file
pub const ENTRY_SIZE: usize = 8;

/// One recorded ipoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct TraceEntry {
    /// Ipoint identifier
    pub id: u32,

    /// Timestamp taken when the entry was stored
    pub timestamp: u32,
}

const _: () = assert!(std::mem::size_of::<TraceEntry>() == ENTRY_SIZE);
const _: () = assert!(std::mem::align_of::<TraceEntry>() == 4);

impl TraceEntry {
    pub const fn new(id: u32, timestamp: u32) -> Self {
        Self { id, timestamp }
    }

    /// Pack into a single word so a slot can be written with one store
    #[inline(always)]
    pub(crate) const fn pack(self) -> u64 {
        ((self.timestamp as u64) << 32) | self.id as u64
    }

    #[inline(always)]
    pub(crate) const fn unpack(word: u64) -> Self {
        Self {
            id: word as u32,
            timestamp: (word >> 32) as u32,
        }
    }

    /// Wire encoding
    pub fn to_bytes(self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[..4].copy_from_slice(&self.id.to_ne_bytes());
        bytes[4..].copy_from_slice(&self.timestamp.to_ne_bytes());
        bytes
    }

    /// Wire decoding
    pub fn from_bytes(bytes: [u8; ENTRY_SIZE]) -> Self {
        let [a, b, c, d, e, f, g, h] = bytes;
        Self {
            id: u32::from_ne_bytes([a, b, c, d]),
            timestamp: u32::from_ne_bytes([e, f, g, h]),
        }
    }
}

/// True if timestamp `a` was taken before `b`, allowing for one wrap
#[inline]
pub fn time_before(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// Extend a sequence of 32-bit timestamps to 64 bits
///
/// Entries are in recorded order, so any timestamp smaller than its
/// predecessor marks a counter wrap.
pub fn unwrap_timestamps(entries: &[TraceEntry]) -> Vec<u64> {
    let mut offset = 0u64;
    let mut previous = None;

    entries
        .iter()
        .map(|entry| {
            if let Some(prev) = previous {
                if entry.timestamp < prev {
                    offset += 1 << 32;
                }
            }
            previous = Some(entry.timestamp);
            offset + entry.timestamp as u64
        })
        .collect()
}
