//! Ipoint recorder and session controller
//!
//! A [`Tracer`] owns the store, the target processor and the session
//! state. [`Tracer::record`] is the ipoint fast path; `reset`, `start` and
//! `stop` move the session through its lifecycle:
//!
//! ```text
//!   Idle ──start()──▶ Running ──stop()──▶ Stopped
//!                       ▲                    │
//!                       └──────start()───────┘
//!
//!   reset() returns to Idle from any state
//! ```
//!
//! Administrative calls must not race an ipoint on the target processor.
//! Nothing here enforces that; callers serialize them.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

use crossbeam::utils::CachePadded;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{NativeClock, ProcessorClock, NO_PROCESSOR};
use crate::config::{TargetProcessor, TraceConfig};
use crate::error::Result;

use super::buffer::RingBufferStore;
use super::entry::TraceEntry;

/// Lifecycle state of the recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SessionState {
    /// Reset and disarmed
    Idle = 0,
    /// Armed; ipoints on the target processor are stored
    Running = 1,
    /// Disarmed with entries kept
    Stopped = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Running,
            2 => SessionState::Stopped,
            _ => SessionState::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a tracer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    pub state: SessionState,
    /// Processor being recorded, if armed with one
    pub target: Option<u32>,
    pub capacity: usize,
    /// Entries currently in the buffer
    pub recorded: usize,
    /// Target-processor ipoints dropped on a full buffer since the last reset
    pub missed: u64,
    /// Entries copied out since construction
    pub downloaded: u64,
    pub overflow_imminent: bool,
}

/// Ipoint recorder bound to one clock
pub struct Tracer<C: ProcessorClock = NativeClock> {
    config: TraceConfig,
    clock: C,
    target: CachePadded<AtomicU32>,
    pub(super) store: RingBufferStore,
    state: AtomicU8,
    overflow_point: usize,
    pub(super) missed: AtomicU64,
    pub(super) downloaded: AtomicU64,
}

impl<C: ProcessorClock> Tracer<C> {
    /// Allocate the buffer and start out `Idle`
    pub fn new(config: TraceConfig, clock: C) -> Result<Self> {
        config.validate()?;

        let tracer = Self {
            target: CachePadded::new(AtomicU32::new(configured_target(&config))),
            store: RingBufferStore::new(config.capacity),
            state: AtomicU8::new(SessionState::Idle as u8),
            overflow_point: config.overflow_point(),
            missed: AtomicU64::new(0),
            downloaded: AtomicU64::new(0),
            config,
            clock,
        };

        info!(
            capacity = tracer.config.capacity,
            processor = ?tracer.config.target,
            clock = tracer.clock.name(),
            "trace buffer allocated"
        );
        Ok(tracer)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Fast path
    // ═══════════════════════════════════════════════════════════════════════

    /// Record ipoint `id`
    ///
    /// Stored only on the target processor while the session is armed and
    /// the buffer has room; otherwise the call has no effect.
    #[inline]
    pub fn record(&self, id: u32) {
        if self.clock.processor_id() != self.target.load(Ordering::Relaxed) {
            return;
        }
        if !self.store.try_append(id, || self.clock.timestamp()) && self.drops_are_missed() {
            self.missed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A rejected ipoint counts as missed only if it hit a full, armed buffer
    #[cold]
    fn drops_are_missed(&self) -> bool {
        self.store.is_full() && self.state() == SessionState::Running
    }

    /// Record ipoint `id`, then report whether overflow is imminent
    #[inline]
    pub fn record_checked(&self, id: u32) -> bool {
        self.record(id);
        self.overflow_imminent()
    }

    /// True once the buffer has filled past the configured threshold
    #[inline]
    pub fn overflow_imminent(&self) -> bool {
        self.store.len() > self.overflow_point
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Session control
    // ═══════════════════════════════════════════════════════════════════════

    /// Discard all entries and disarm
    pub fn reset(&self) {
        self.store.clear();
        self.target
            .store(configured_target(&self.config), Ordering::Release);
        self.missed.store(0, Ordering::Relaxed);
        self.set_state(SessionState::Idle);
        debug!("trace reset");
    }

    /// Arm recording up to capacity, keeping existing entries
    ///
    /// A `Caller` target is bound to the processor running this call.
    pub fn start(&self) {
        let target = match self.config.target {
            TargetProcessor::Processor(id) => id,
            TargetProcessor::Caller => self.clock.processor_id(),
        };
        if target == NO_PROCESSOR {
            warn!(
                clock = self.clock.name(),
                "cannot identify the calling processor; recording stays disarmed"
            );
            return;
        }

        self.target.store(target, Ordering::Release);
        self.store.arm();
        self.set_state(SessionState::Running);
        debug!(processor = target, recorded = self.store.len(), "trace started");
    }

    /// Freeze the buffer at its current length
    pub fn stop(&self) {
        self.store.freeze();
        self.set_state(SessionState::Stopped);
        debug!(recorded = self.store.len(), "trace stopped");
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Processor currently being recorded, if any
    pub fn target(&self) -> Option<u32> {
        match self.target.load(Ordering::Acquire) {
            NO_PROCESSOR => None,
            id => Some(id),
        }
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Entries currently in the buffer
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.store.is_full()
    }

    pub fn missed(&self) -> u64 {
        self.missed.load(Ordering::Relaxed)
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::Relaxed)
    }

    /// Copy of every recorded entry, without counting as a download
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.store.snapshot()
    }

    pub fn stats(&self) -> TraceStats {
        TraceStats {
            state: self.state(),
            target: self.target(),
            capacity: self.capacity(),
            recorded: self.len(),
            missed: self.missed(),
            downloaded: self.downloaded(),
            overflow_imminent: self.overflow_imminent(),
        }
    }
}

impl<C: ProcessorClock> std::fmt::Debug for Tracer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("clock", &self.clock.name())
            .field("state", &self.state())
            .field("target", &self.target())
            .field("store", &self.store)
            .finish()
    }
}

/// Target in force before the first `start()`
fn configured_target(config: &TraceConfig) -> u32 {
    match config.target {
        TargetProcessor::Processor(id) => id,
        TargetProcessor::Caller => NO_PROCESSOR,
    }
}
