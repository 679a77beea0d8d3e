//! Process-wide tracer
//!
//! One tracer per process, constructed once at startup with [`install`]
//! and never torn down. The free functions below are the control surface
//! used by instrumented code and runtime startup/shutdown hooks; before
//! `install` they do nothing.
//!
//! Code that can carry a handle should prefer a `&Tracer` from
//! [`install`] or [`tracer`] over the free functions.

use std::sync::OnceLock;

use tracing::info;

use crate::clock::NativeClock;
use crate::config::TraceConfig;
use crate::error::{RVSError, Result};
use crate::trace::{TraceEntry, TraceStats, Tracer};

static TRACER: OnceLock<Tracer<NativeClock>> = OnceLock::new();

/// Construct the process-wide tracer
///
/// Fails with `AlreadyInstalled` on every call after the first success.
pub fn install(config: TraceConfig) -> Result<&'static Tracer<NativeClock>> {
    if TRACER.get().is_some() {
        return Err(RVSError::AlreadyInstalled);
    }

    let tracer = Tracer::new(config, NativeClock::new())?;
    TRACER
        .set(tracer)
        .map_err(|_| RVSError::AlreadyInstalled)?;

    let tracer = installed()?;
    info!(capacity = tracer.capacity(), "process-wide tracer installed");
    Ok(tracer)
}

/// The process-wide tracer, if installed
pub fn tracer() -> Option<&'static Tracer<NativeClock>> {
    TRACER.get()
}

/// The process-wide tracer, or `NotInstalled`
pub fn installed() -> Result<&'static Tracer<NativeClock>> {
    TRACER.get().ok_or(RVSError::NotInstalled)
}

pub fn reset() {
    if let Some(tracer) = tracer() {
        tracer.reset();
    }
}

pub fn start() {
    if let Some(tracer) = tracer() {
        tracer.start();
    }
}

pub fn stop() {
    if let Some(tracer) = tracer() {
        tracer.stop();
    }
}

/// Record ipoint `id` on the process-wide tracer
#[inline]
pub fn ipoint(id: u32) {
    if let Some(tracer) = TRACER.get() {
        tracer.record(id);
    }
}

/// Record ipoint `id`; true if overflow is imminent
#[inline]
pub fn ipoint_checked(id: u32) -> bool {
    match TRACER.get() {
        Some(tracer) => tracer.record_checked(id),
        None => false,
    }
}

/// Copy recorded entries into `destination`; 0 before install
pub fn download(destination: &mut [TraceEntry]) -> usize {
    tracer().map_or(0, |tracer| tracer.download(destination))
}

pub fn stats() -> Option<TraceStats> {
    tracer().map(|tracer| tracer.stats())
}
