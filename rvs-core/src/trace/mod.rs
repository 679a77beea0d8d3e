//! Ipoint trace buffer
//!
//! Records `(id, timestamp)` pairs from exactly one processor into a
//! pre-allocated buffer, then hands them to a consumer.
//!
//! ## Key Properties
//!
//! - **Bounded ipoint path**: one identity read, two comparisons, one store
//! - **No wraparound**: a full buffer drops new ipoints and keeps the old
//! - **Lock-free**: processor filtering replaces locking; there is only
//!   ever one writer per session
//! - **Persistent**: entries survive `stop()`/`start()` and downloads;
//!   only `reset()` clears
//!
//! ## Architecture
//!
//! ```text
//! instrumented code        Tracer<C>                  consumer
//! ─────────────────        ─────────                  ────────
//! record(id) ─────────────► filter on target ──┐
//!                           bound check        │
//!                           RingBufferStore ◄──┘
//! reset/start/stop ───────► arm / freeze bound
//!                           download*() ──────────────► &mut [TraceEntry]
//!                                                       &mut [u8]
//!                                                       *mut (C ABI)
//! ```

mod buffer;
mod entry;
mod export;
mod file;
pub mod markers;
mod merge;
mod tracer;

pub use buffer::RingBufferStore;
pub use entry::{time_before, unwrap_timestamps, TraceEntry, ENTRY_SIZE};
pub use export::validate_destination;
pub use file::{read_trace, read_trace_file, write_trace, write_trace_file, TRACE_FILE_NAME};
pub use merge::merge_traces;
pub use tracer::{SessionState, TraceStats, Tracer};
