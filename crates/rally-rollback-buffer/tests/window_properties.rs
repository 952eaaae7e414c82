//! Property tests for the snapshot ring window

use proptest::prelude::*;
use rally_core::{Snapshot, StateHistory};
use rally_rollback_buffer::SnapshotHistory;

fn snap(frame: u64) -> Snapshot {
    let mut s = Snapshot::new(frame);
    s.checksum = (frame as u32).wrapping_mul(2_654_435_761);
    s
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// After pushing 0..=C+k consecutively only [k+1, C+k] is reachable,
    /// each with the exact snapshot pushed for it
    #[test]
    fn consecutive_push_window(capacity in 1usize..64, k in 0u64..64) {
        let mut history = SnapshotHistory::new(capacity);
        let c = capacity as u64;
        for frame in 0..=c + k {
            history.push(snap(frame));
        }

        for frame in 0..=c + k + 2 {
            let got = history.get(frame);
            if frame >= k + 1 && frame <= c + k {
                prop_assert_eq!(got, Some(&snap(frame)));
            } else {
                prop_assert!(got.is_none());
            }
        }
        prop_assert_eq!(history.frame_range(), Some((k + 1, c + k)));
        prop_assert_eq!(history.len(), capacity);
    }

    /// No frame ever reports a snapshot for a different frame
    #[test]
    fn lookups_never_alias(capacity in 1usize..16, frames in prop::collection::vec(0u64..200, 1..100)) {
        let mut history = SnapshotHistory::new(capacity);
        for frame in frames {
            history.push(snap(frame));
            let (oldest, newest) = history.frame_range().unwrap();
            prop_assert!(oldest <= newest);
            prop_assert!(newest - oldest < capacity as u64);
        }
        for frame in 0..210 {
            if let Some(s) = history.get(frame) {
                prop_assert_eq!(s.frame, frame);
            }
        }
    }
}
