//! Merging two traces into one timeline
//!
//! Two tracers (for example one per processor, or a user-space trace and a
//! kernel trace) each produce entries in recorded order. Merging interleaves
//! them by timestamp with [`time_before`], so a single counter wrap between
//! neighbouring entries still orders correctly.

use super::entry::{time_before, TraceEntry};

/// Interleave `primary` and `secondary` by timestamp
///
/// Each input keeps its own order. A `secondary` entry goes first only when
/// it is strictly before the next `primary` entry, so equal timestamps keep
/// the `primary` entry first. Once either input runs out, the rest of the
/// other is appended unchanged.
pub fn merge_traces(primary: &[TraceEntry], secondary: &[TraceEntry]) -> Vec<TraceEntry> {
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());
    let (mut p, mut s) = (0, 0);

    while p < primary.len() && s < secondary.len() {
        if time_before(secondary[s].timestamp, primary[p].timestamp) {
            merged.push(secondary[s]);
            s += 1;
        } else {
            merged.push(primary[p]);
            p += 1;
        }
    }

    merged.extend_from_slice(&primary[p..]);
    merged.extend_from_slice(&secondary[s..]);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(u32, u32)]) -> Vec<TraceEntry> {
        pairs.iter().map(|&(id, ts)| TraceEntry::new(id, ts)).collect()
    }

    fn ids(entries: &[TraceEntry]) -> Vec<u32> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_merge_interleaves_by_timestamp() {
        let a = entries(&[(1, 10), (2, 30), (3, 50)]);
        let b = entries(&[(10, 20), (11, 40), (12, 60), (13, 70)]);

        assert_eq!(ids(&merge_traces(&a, &b)), vec![1, 10, 2, 11, 3, 12, 13]);
    }

    #[test]
    fn test_merge_ties_keep_primary_first() {
        let a = entries(&[(1, 10), (2, 20)]);
        let b = entries(&[(10, 10), (11, 20)]);

        assert_eq!(ids(&merge_traces(&a, &b)), vec![1, 10, 2, 11]);
        assert_eq!(ids(&merge_traces(&b, &a)), vec![10, 1, 11, 2]);
    }

    #[test]
    fn test_merge_across_counter_wrap() {
        let a = entries(&[(1, u32::MAX - 20), (2, 5), (3, 40)]);
        let b = entries(&[(10, u32::MAX - 10), (11, 20)]);

        let merged = merge_traces(&a, &b);
        assert_eq!(ids(&merged), vec![1, 10, 2, 11, 3]);
        assert!(merged
            .windows(2)
            .all(|pair| !time_before(pair[1].timestamp, pair[0].timestamp)));
    }

    #[test]
    fn test_merge_keeps_input_order_within_each_trace() {
        // Out-of-order input is never resorted; it only interleaves.
        let a = entries(&[(1, 50), (2, 10)]);
        let b = entries(&[(10, 30)]);

        assert_eq!(ids(&merge_traces(&a, &b)), vec![10, 1, 2]);
    }

    #[test]
    fn test_merge_with_empty_side() {
        let a = entries(&[(1, 10), (2, 20)]);

        assert_eq!(merge_traces(&a, &[]), a);
        assert_eq!(merge_traces(&[], &a), a);
        assert!(merge_traces(&[], &[]).is_empty());
    }
}
