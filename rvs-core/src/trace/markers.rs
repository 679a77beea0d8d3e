//! Reserved ipoint ids
//!
//! The top sixteen ids mark kernel and runtime events interleaved with
//! user ipoints (context switches, interrupts, syscalls, trace flushes).
//! Instrumentation must not allocate ids in this range.

pub const MATHEMU_ENTRY: u32 = 0xffff_fffd;
pub const MATHEMU_EXIT: u32 = 0xffff_fffc;
pub const PFAULT_ENTRY: u32 = 0xffff_fffb;
pub const PFAULT_EXIT: u32 = 0xffff_fffa;
pub const TIMER_ENTRY: u32 = 0xffff_fff9;
pub const TIMER_EXIT: u32 = 0xffff_fff8;
pub const SYS_ENTRY: u32 = 0xffff_fff7;
pub const SYS_EXIT: u32 = 0xffff_fff6;
pub const IRQ_ENTRY: u32 = 0xffff_fff5;
pub const IRQ_EXIT: u32 = 0xffff_fff4;
/// Traced task suspended
pub const SWITCH_FROM: u32 = 0xffff_fff3;
/// Traced task resumed
pub const SWITCH_TO: u32 = 0xffff_fff2;
/// Consumer began writing the trace out
pub const BEGIN_WRITE: u32 = 0xffff_fff1;
/// Consumer finished writing the trace out
pub const END_WRITE: u32 = 0xffff_fff0;

/// Lowest reserved id
pub const RESERVED_BASE: u32 = 0xffff_fff0;

/// True if `id` is in the reserved range
#[inline]
pub fn is_reserved(id: u32) -> bool {
    id >= RESERVED_BASE
}

/// Name of a reserved id, if it has one
pub fn marker_name(id: u32) -> Option<&'static str> {
    let name = match id {
        MATHEMU_ENTRY => "MATHEMU_ENTRY",
        MATHEMU_EXIT => "MATHEMU_EXIT",
        PFAULT_ENTRY => "PFAULT_ENTRY",
        PFAULT_EXIT => "PFAULT_EXIT",
        TIMER_ENTRY => "TIMER_ENTRY",
        TIMER_EXIT => "TIMER_EXIT",
        SYS_ENTRY => "SYS_ENTRY",
        SYS_EXIT => "SYS_EXIT",
        IRQ_ENTRY => "IRQ_ENTRY",
        IRQ_EXIT => "IRQ_EXIT",
        SWITCH_FROM => "SWITCH_FROM",
        SWITCH_TO => "SWITCH_TO",
        BEGIN_WRITE => "BEGIN_WRITE",
        END_WRITE => "END_WRITE",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_names() {
        assert_eq!(marker_name(SWITCH_TO), Some("SWITCH_TO"));
        assert_eq!(marker_name(TIMER_ENTRY), Some("TIMER_ENTRY"));
        assert_eq!(marker_name(42), None);
        // spare reserved ids have no name
        assert_eq!(marker_name(0xffff_ffff), None);
    }

    #[test]
    fn test_reserved_range() {
        assert!(is_reserved(END_WRITE));
        assert!(is_reserved(u32::MAX));
        assert!(!is_reserved(RESERVED_BASE - 1));
    }
}
