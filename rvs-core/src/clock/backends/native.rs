//! Native clock backend
//!
//! Timestamps come from the cycle counter the architecture exposes to
//! unprivileged code; the processor identity comes from the OS.

use std::time::Instant;

use crate::clock::ProcessorClock;

/// Hardware clock for instrumented programs
///
/// | arch      | timestamp                    |
/// |-----------|------------------------------|
/// | `x86_64`  | `rdtsc`, low 32 bits         |
/// | `aarch64` | `cntvct_el0`, low 32 bits    |
/// | other     | nanoseconds since `new()`    |
///
/// Processor identity is `sched_getcpu()` on Linux and `0` elsewhere.
#[derive(Debug, Clone)]
pub struct NativeClock {
    #[cfg_attr(any(target_arch = "x86_64", target_arch = "aarch64"), allow(dead_code))]
    origin: Instant,
}

impl NativeClock {
    /// Create a new native clock
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for NativeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorClock for NativeClock {
    #[inline(always)]
    fn processor_id(&self) -> u32 {
        current_processor()
    }

    #[inline(always)]
    fn timestamp(&self) -> u32 {
        #[cfg(target_arch = "x86_64")]
        {
            // SAFETY: rdtsc has no memory effects and is available in user mode.
            unsafe { core::arch::x86_64::_rdtsc() as u32 }
        }

        #[cfg(target_arch = "aarch64")]
        {
            let ticks: u64;
            // SAFETY: the virtual counter is readable from EL0 on every
            // supported OS; the read has no side effects.
            unsafe {
                core::arch::asm!(
                    "mrs {}, cntvct_el0",
                    out(reg) ticks,
                    options(nomem, nostack, preserves_flags)
                );
            }
            ticks as u32
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            self.origin.elapsed().as_nanos() as u32
        }
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

#[cfg(target_os = "linux")]
#[inline(always)]
fn current_processor() -> u32 {
    // SAFETY: sched_getcpu takes no arguments and only reads kernel state.
    let cpu = unsafe { libc::sched_getcpu() };
    if cpu < 0 {
        crate::clock::NO_PROCESSOR
    } else {
        cpu as u32
    }
}

#[cfg(not(target_os = "linux"))]
#[inline(always)]
fn current_processor() -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::NO_PROCESSOR;

    #[test]
    fn test_native_clock_identifies_processor() {
        let clock = NativeClock::new();
        assert_ne!(clock.processor_id(), NO_PROCESSOR);
        assert_eq!(clock.name(), "native");
    }

    #[test]
    fn test_native_clock_advances() {
        let clock = NativeClock::new();
        let first = clock.timestamp();
        let mut moved = false;
        for _ in 0..1_000_000 {
            if clock.timestamp() != first {
                moved = true;
                break;
            }
        }
        assert!(moved, "timestamp never changed");
    }
}
