//! # RVS Core - ipoint trace buffer
//!
//! RVS records the order and timing of instrumentation points ("ipoints")
//! hit by a program, for offline timing and coverage analysis:
//!
//! - **Ipoint path**: [`Tracer::record`] stores `(id, timestamp)` at constant
//!   cost, only on the target processor, only while armed
//! - **Session control**: `reset`, `start` and `stop` arm and freeze the
//!   buffer's write bound
//! - **Export**: `download*` copies the recorded prefix to a consumer,
//!   validating raw destinations first
//!
//! ## Core Principle
//!
//! > The ipoint path never costs more than it did the last time.
//!
//! A full buffer, a stopped session and a non-target processor all drop
//! the ipoint silently. Nothing on the ipoint path locks, allocates or
//! returns an error.
//!
//! ## Example
//!
//! ```rust
//! use rvs_core::{MockClock, TraceConfig, TraceEntry, Tracer};
//!
//! let clock = MockClock::with_step(10);
//! let tracer = Tracer::new(TraceConfig::minimal().with_capacity(4), clock).unwrap();
//!
//! tracer.reset();
//! tracer.start();
//! tracer.record(1);
//! tracer.record(2);
//! tracer.stop();
//!
//! let mut dest = [TraceEntry::default(); 4];
//! assert_eq!(tracer.download(&mut dest), 2);
//! assert_eq!(dest[1], TraceEntry::new(2, 10));
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod global;
pub mod trace;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export main types
pub use clock::{MockClock, NativeClock, ProcessorClock, NO_PROCESSOR};
pub use config::{TargetProcessor, TraceConfig, DEFAULT_CAPACITY};
pub use error::{ErrorCategory, RVSError, Result};
pub use trace::{
    markers, merge_traces, time_before, RingBufferStore, SessionState, TraceEntry, TraceStats,
    Tracer, ENTRY_SIZE,
};

/// C ABI version, bumped on any incompatible change to `ffi`
pub const API_VERSION: u32 = 1;
