//! # Clock & Processor Identity
//!
//! The tracer consumes exactly two primitive reads: the identity of the
//! processor executing the ipoint, and a free-running timestamp. Both are
//! platform-specific; everything else in the recorder is ordinary code.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Tracer<C: ProcessorClock>                      │
//! │  • processor_id() on every ipoint (filter)                          │
//! │  • timestamp() only when an entry is actually stored                │
//! └────────────────────────────────┬────────────────────────────────────┘
//!                                  │
//!                                  ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      ProcessorClock (trait)                         │
//! ├──────────────────────────────────┬──────────────────────────────────┤
//! │ NativeClock                      │ MockClock                        │
//! │ (rdtsc / cntvct_el0, getcpu)     │ (testing, deterministic)         │
//! └──────────────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! Implementations must be callable from any context: no locks, no
//! allocation, no blocking.

pub mod backends;

pub use backends::{MockClock, NativeClock};

/// Processor identity that never matches a real processor.
///
/// Used as the disarmed target and reported by clocks that cannot
/// identify the executing processor, so nothing is recorded.
pub const NO_PROCESSOR: u32 = u32::MAX;

/// Source of processor identity and time for the ipoint fast path
pub trait ProcessorClock: Send + Sync {
    /// Stable identity of the processor executing the caller
    fn processor_id(&self) -> u32;

    /// Free-running 32-bit timestamp; wraps, compare with `time_before`
    fn timestamp(&self) -> u32;

    /// Backend name (for logging)
    fn name(&self) -> &'static str;
}

impl<C: ProcessorClock + ?Sized> ProcessorClock for &C {
    #[inline(always)]
    fn processor_id(&self) -> u32 {
        (**self).processor_id()
    }

    #[inline(always)]
    fn timestamp(&self) -> u32 {
        (**self).timestamp()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<C: ProcessorClock + ?Sized> ProcessorClock for std::sync::Arc<C> {
    #[inline(always)]
    fn processor_id(&self) -> u32 {
        (**self).processor_id()
    }

    #[inline(always)]
    fn timestamp(&self) -> u32 {
        (**self).timestamp()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn read_through<C: ProcessorClock>(clock: C) -> (u32, u32) {
        (clock.processor_id(), clock.timestamp())
    }

    #[test]
    fn test_clock_through_reference_and_arc() {
        let clock = MockClock::new();
        clock.set_processor(3);
        clock.set_time(77);

        assert_eq!(read_through(&clock), (3, 77));

        let shared = Arc::new(clock);
        assert_eq!(read_through(shared.clone()), (3, 77));
        assert_eq!(shared.name(), "mock");
    }
}
