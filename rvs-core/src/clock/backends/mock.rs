//! Mock clock backend for testing
//!
//! Processor identity and time are set explicitly, so tests can replay
//! exact interleavings of ipoints across processors.

use std::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::clock::ProcessorClock;

thread_local! {
    static PINNED_PROCESSOR: Cell<Option<u32>> = const { Cell::new(None) };
}

/// Deterministic clock
///
/// `processor_id()` returns the calling thread's pinned processor if one
/// was set with [`MockClock::pin_current_thread`], otherwise the shared
/// processor. `timestamp()` returns the current time and then advances it
/// by the configured step (0 by default).
#[derive(Debug, Default)]
pub struct MockClock {
    processor: AtomicU32,
    now: AtomicU32,
    step: AtomicU32,
}

impl MockClock {
    /// Create a mock clock on processor 0 at time 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock clock whose time advances by `step` on every read
    pub fn with_step(step: u32) -> Self {
        let clock = Self::new();
        clock.step.store(step, Ordering::Relaxed);
        clock
    }

    /// Set the shared processor identity
    pub fn set_processor(&self, processor: u32) {
        self.processor.store(processor, Ordering::Relaxed);
    }

    /// Set the current time
    pub fn set_time(&self, now: u32) {
        self.now.store(now, Ordering::Relaxed);
    }

    /// Current time without advancing it
    pub fn now(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }

    /// Make every mock clock report `processor` on the calling thread
    pub fn pin_current_thread(processor: u32) {
        PINNED_PROCESSOR.with(|p| p.set(Some(processor)));
    }

    /// Drop the calling thread's pinned processor
    pub fn unpin_current_thread() {
        PINNED_PROCESSOR.with(|p| p.set(None));
    }
}

impl ProcessorClock for MockClock {
    fn processor_id(&self) -> u32 {
        PINNED_PROCESSOR
            .with(|p| p.get())
            .unwrap_or_else(|| self.processor.load(Ordering::Relaxed))
    }

    fn timestamp(&self) -> u32 {
        let step = self.step.load(Ordering::Relaxed);
        self.now.fetch_add(step, Ordering::Relaxed)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
