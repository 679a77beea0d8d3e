//! Fixed-capacity trace store
//!
//! Pre-allocated slots plus two cursors:
//!
//! ```text
//!  0                 write_cursor        bound_cursor         capacity
//!  ├── recorded ──────────┤── writable ────────┤── locked ────────┤
//! ```
//!
//! `write_cursor` is the next free slot; `bound_cursor` is how far writes
//! may currently reach. `0 <= write_cursor <= bound_cursor <= capacity`.
//! There is no wraparound: once `write_cursor == capacity` every further
//! append is dropped until the store is cleared.
//!
//! Each slot is one `AtomicU64` holding a packed entry, so an append is a
//! single relaxed store followed by a release store of the cursor. Only one
//! processor ever appends during a session; the atomics exist so that the
//! store can be shared, not to arbitrate between writers.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;

use super::entry::{TraceEntry, ENTRY_SIZE};

/// Slots and cursors backing a tracer
pub struct RingBufferStore {
    slots: Box<[AtomicU64]>,
    write_cursor: CachePadded<AtomicUsize>,
    bound_cursor: CachePadded<AtomicUsize>,
}

impl RingBufferStore {
    /// Allocate a disarmed store of `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| AtomicU64::new(0)).collect();

        Self {
            slots,
            write_cursor: CachePadded::new(AtomicUsize::new(0)),
            bound_cursor: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Append an entry if the bound allows it
    ///
    /// `timestamp` is only evaluated when the entry is stored. Returns
    /// whether the entry was stored.
    #[inline(always)]
    pub fn try_append(&self, id: u32, timestamp: impl FnOnce() -> u32) -> bool {
        let write = self.write_cursor.load(Ordering::Relaxed);
        if write >= self.bound_cursor.load(Ordering::Relaxed) {
            return false;
        }

        let entry = TraceEntry::new(id, timestamp());
        self.slots[write].store(entry.pack(), Ordering::Relaxed);
        self.write_cursor.store(write + 1, Ordering::Release);
        true
    }

    /// Allow writes up to capacity
    pub fn arm(&self) {
        self.bound_cursor.store(self.slots.len(), Ordering::Release);
    }

    /// Freeze the bound at the current write position
    pub fn freeze(&self) {
        let write = self.write_cursor.load(Ordering::Acquire);
        self.bound_cursor.store(write, Ordering::Release);
    }

    /// Discard all entries and disarm
    pub fn clear(&self) {
        // Lower the bound first so a racing append sees write >= bound.
        self.bound_cursor.store(0, Ordering::Release);
        self.write_cursor.store(0, Ordering::Release);
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of recorded entries
    pub fn len(&self) -> usize {
        self.write_cursor.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current write bound
    pub fn bound(&self) -> usize {
        self.bound_cursor.load(Ordering::Acquire)
    }

    /// True once every slot has been written
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.write_cursor.load(Ordering::Relaxed) >= self.slots.len()
    }

    /// Copy the first `min(len, destination.len())` entries
    pub fn copy_prefix(&self, destination: &mut [TraceEntry]) -> usize {
        let count = self.len().min(destination.len());
        for (slot, out) in self.slots[..count].iter().zip(destination.iter_mut()) {
            *out = TraceEntry::unpack(slot.load(Ordering::Relaxed));
        }
        count
    }

    /// Copy the first entries as wire records into `destination`
    ///
    /// Trailing bytes that cannot hold a whole record are left untouched.
    pub fn copy_prefix_bytes(&self, destination: &mut [u8]) -> usize {
        let count = self.len().min(destination.len() / ENTRY_SIZE);
        for (slot, out) in self.slots[..count]
            .iter()
            .zip(destination.chunks_exact_mut(ENTRY_SIZE))
        {
            out.copy_from_slice(&TraceEntry::unpack(slot.load(Ordering::Relaxed)).to_bytes());
        }
        count
    }

    /// Copy out every recorded entry
    pub fn snapshot(&self) -> Vec<TraceEntry> {
        let mut entries = vec![TraceEntry::default(); self.len()];
        let copied = self.copy_prefix(&mut entries);
        entries.truncate(copied);
        entries
    }
}

impl std::fmt::Debug for RingBufferStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBufferStore")
            .field("capacity", &self.capacity())
            .field("write_cursor", &self.len())
            .field("bound_cursor", &self.bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_disarmed() {
        let store = RingBufferStore::new(4);
        assert!(!store.try_append(1, || 10));
        assert!(store.is_empty());
        assert_eq!(store.bound(), 0);
    }

    #[test]
    fn test_append_until_full() {
        let store = RingBufferStore::new(3);
        store.arm();

        for id in 0..5 {
            store.try_append(id, || id * 10);
        }

        assert!(store.is_full());
        assert_eq!(
            store.snapshot(),
            vec![
                TraceEntry::new(0, 0),
                TraceEntry::new(1, 10),
                TraceEntry::new(2, 20),
            ]
        );
    }

    #[test]
    fn test_timestamp_not_read_when_rejected() {
        let store = RingBufferStore::new(1);
        let mut reads = 0;
        store.try_append(1, || {
            reads += 1;
            0
        });
        assert_eq!(reads, 0);
    }

    #[test]
    fn test_freeze_keeps_entries() {
        let store = RingBufferStore::new(8);
        store.arm();
        store.try_append(1, || 1);
        store.try_append(2, || 2);
        store.freeze();

        assert_eq!(store.bound(), 2);
        assert!(!store.try_append(3, || 3));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear_discards_entries() {
        let store = RingBufferStore::new(8);
        store.arm();
        store.try_append(1, || 1);
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.bound(), 0);
        assert!(!store.try_append(2, || 2));
    }

    #[test]
    fn test_copy_prefix_bytes_ignores_partial_record() {
        let store = RingBufferStore::new(4);
        store.arm();
        store.try_append(7, || 70);
        store.try_append(8, || 80);

        let mut bytes = [0xaau8; ENTRY_SIZE + 3];
        assert_eq!(store.copy_prefix_bytes(&mut bytes), 1);
        assert_eq!(&bytes[..ENTRY_SIZE], &TraceEntry::new(7, 70).to_bytes());
        assert_eq!(&bytes[ENTRY_SIZE..], &[0xaa, 0xaa, 0xaa]);
    }
}
