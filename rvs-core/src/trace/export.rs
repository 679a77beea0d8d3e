//! Export path
//!
//! Copies the recorded prefix out of a tracer. Every variant copies
//! `min(recorded, room)` entries from index 0 in recorded order and never
//! clears the buffer. Downloading while the session is running races the
//! recorder and yields an unspecified prefix; it is logged, not refused.
//!
//! [`Tracer::download_raw`] is the path for destinations owned by another
//! domain (the C ABI, a user-space consumer). It validates the pointer and
//! size before any write.

use std::sync::atomic::Ordering;

use tracing::{debug, warn};

use crate::clock::ProcessorClock;
use crate::error::{RVSError, Result};

use super::entry::{TraceEntry, ENTRY_SIZE};
use super::tracer::{SessionState, Tracer};

impl<C: ProcessorClock> Tracer<C> {
    /// Copy recorded entries into `destination`; returns the count copied
    pub fn download(&self, destination: &mut [TraceEntry]) -> usize {
        self.check_download_hazards();
        let copied = self.store.copy_prefix(destination);
        self.finish_download(copied)
    }

    /// Copy recorded entries into `destination` as 8-byte wire records
    pub fn download_bytes(&self, destination: &mut [u8]) -> usize {
        self.check_download_hazards();
        let copied = self.store.copy_prefix_bytes(destination);
        self.finish_download(copied)
    }

    /// Copy recorded entries into a raw destination of `size` bytes
    ///
    /// Returns the number of entries copied, or `-errno` when the
    /// destination itself is invalid: null or past the end of the address
    /// space gives `-EFAULT`, misalignment gives `-EINVAL`. A size below one
    /// entry copies nothing and returns 0.
    ///
    /// # Safety
    ///
    /// If `destination` is non-null and aligned, it must be valid for writes
    /// of `size` bytes and must not alias the tracer.
    pub unsafe fn download_raw(&self, destination: *mut TraceEntry, size: usize) -> isize {
        match validate_destination(destination, size) {
            Ok(room) => self.download_validated(destination, room) as isize,
            Err(err) => {
                debug!(error = %err, "download destination rejected");
                -(err.errno() as isize)
            }
        }
    }

    /// Copy into a destination already accepted by [`validate_destination`]
    ///
    /// # Safety
    ///
    /// `room` must be the value `validate_destination` returned for
    /// `destination`, and `destination` must be valid for writes of `room`
    /// entries.
    pub(crate) unsafe fn download_validated(
        &self,
        destination: *mut TraceEntry,
        room: usize,
    ) -> usize {
        if room == 0 {
            return 0;
        }

        // SAFETY: non-null, aligned and within the address space per
        // validate_destination; validity for writes is the caller's contract.
        let destination = std::slice::from_raw_parts_mut(destination, room);
        self.download(destination)
    }

    fn check_download_hazards(&self) {
        if self.state() == SessionState::Running {
            warn!("downloading while the trace is running; the copied prefix may be incomplete");
        }
        if self.store.is_full() {
            warn!(
                capacity = self.store.capacity(),
                missed = self.missed.load(Ordering::Relaxed),
                "trace buffer is full"
            );
        }
    }

    fn finish_download(&self, copied: usize) -> usize {
        self.downloaded.fetch_add(copied as u64, Ordering::Relaxed);
        debug!(copied, recorded = self.store.len(), "trace downloaded");
        copied
    }
}

/// Check a raw download destination; returns how many entries fit
pub fn validate_destination(destination: *const TraceEntry, size: usize) -> Result<usize> {
    if destination.is_null() {
        return Err(RVSError::InvalidDestination {
            reason: "null pointer".to_string(),
        });
    }

    let address = destination as usize;
    let align = std::mem::align_of::<TraceEntry>();
    if address % align != 0 {
        return Err(RVSError::MisalignedDestination { address, align });
    }

    if size > isize::MAX as usize || address.checked_add(size).is_none() {
        return Err(RVSError::InvalidDestination {
            reason: format!("{} bytes at {:#x} exceed the address space", size, address),
        });
    }

    Ok(size / ENTRY_SIZE)
}
