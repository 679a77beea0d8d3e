//! The process-wide tracer through the C ABI and the free functions.
//!
//! Installing is one-shot per process, so the whole lifecycle lives in a
//! single test.

use std::ffi::CStr;
use std::ptr;

use rvs_core::ffi::{
    rvs_get_last_error, rvs_free_string, rvs_trace_download, rvs_trace_get_stats,
    rvs_trace_init, rvs_trace_ipoint, rvs_trace_ipoint_checked, rvs_trace_reset,
    rvs_trace_start, rvs_trace_stop, RvsEntry, RvsStats,
};
use rvs_core::{global, TraceConfig, ENTRY_SIZE, NO_PROCESSOR};

/// Pin the test thread so a caller-bound target keeps matching
#[cfg(target_os = "linux")]
fn pin_current_thread() -> bool {
    let cpu = unsafe { libc::sched_getcpu() };
    if cpu < 0 {
        return false;
    }
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(cpu as usize, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_current_thread() -> bool {
    true
}

fn last_error() -> String {
    let error = rvs_get_last_error();
    assert!(!error.is_null());
    let message = unsafe { CStr::from_ptr(error) }.to_string_lossy().into_owned();
    rvs_free_string(error);
    message
}

#[test]
fn test_global_tracer_lifecycle() {
    // Before init everything is inert.
    rvs_trace_start();
    rvs_trace_ipoint(1);
    let mut dest = [RvsEntry::default(); 16];
    assert_eq!(unsafe { rvs_trace_download(dest.as_mut_ptr(), 16 * ENTRY_SIZE) }, 0);

    let mut stats = RvsStats::default();
    assert_eq!(unsafe { rvs_trace_get_stats(&mut stats) }, -libc::ENODEV);
    assert!(last_error().contains("not installed"));

    // Init once; the second attempt is refused.
    assert_eq!(rvs_trace_init(-1, 8), 0);
    assert_eq!(rvs_trace_init(0, 8), -libc::EBUSY);
    assert!(last_error().contains("already installed"));
    assert_eq!(
        global::install(TraceConfig::minimal()).unwrap_err().error_code(),
        "ALREADY_INSTALLED"
    );

    let pinned = pin_current_thread();

    rvs_trace_reset();
    rvs_trace_start();
    for id in 1..=6 {
        rvs_trace_ipoint(id);
    }
    let imminent = rvs_trace_ipoint_checked(7);
    rvs_trace_stop();

    assert_eq!(unsafe { rvs_trace_get_stats(&mut stats) }, 0);
    assert_eq!(stats.capacity, 8);
    assert_eq!(stats.state, 2);

    let copied = unsafe { rvs_trace_download(dest.as_mut_ptr(), 16 * ENTRY_SIZE) };
    assert!(copied >= 0);
    let copied = copied as usize;
    if pinned {
        assert_ne!(stats.target, NO_PROCESSOR);
        assert_eq!(copied, 7);
        assert_eq!(imminent, 1);
    }
    let ids: Vec<u32> = dest[..copied].iter().map(|e| e.id).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    // A one-entry-short destination still gets a prefix.
    let short = unsafe { rvs_trace_download(dest.as_mut_ptr(), ENTRY_SIZE + 3) };
    assert_eq!(short, copied.min(1) as isize);

    // Bad destinations fail without touching the buffer.
    assert_eq!(
        unsafe { rvs_trace_download(ptr::null_mut(), 64) },
        -(libc::EFAULT as isize)
    );
    assert_eq!(global::stats().map(|s| s.recorded), Some(copied));

    // Free functions drive the same tracer.
    global::reset();
    assert_eq!(global::download(&mut dest), 0);
    assert_eq!(global::tracer().map(|t| t.is_empty()), Some(true));
    assert_eq!(global::stats().map(|s| s.target), Some(None));
}
