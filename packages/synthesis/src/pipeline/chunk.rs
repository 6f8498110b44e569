//! Time-window chunking for long transcripts.

use crate::types::ContentSegment;

/// Split segments into time-bounded windows.
///
/// Greedy: segments accumulate into the current window until the next
/// segment's start time is `max_secs` or more past the window's start,
/// at which point the window closes and a new one opens at that
/// segment. Windows never split a segment, so each window is at most
/// `max_secs` plus one segment's duration, and every window boundary
/// is a segment start.
pub fn chunk_segments(segments: &[ContentSegment], max_secs: f64) -> Vec<Vec<ContentSegment>> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current: Vec<ContentSegment> = Vec::new();
    let mut chunk_start = segments[0].start_time;

    for segment in segments {
        if segment.start_time - chunk_start >= max_secs && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            chunk_start = segment.start_time;
        }
        current.push(segment.clone());
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// One segment per minute for `minutes` minutes.
    fn minute_segments(minutes: usize) -> Vec<ContentSegment> {
        (0..minutes)
            .map(|i| {
                ContentSegment::new(
                    format!("minute {i}"),
                    i as f64 * 60.0,
                    (i as f64 + 1.0) * 60.0,
                )
            })
            .collect()
    }

    #[test]
    fn empty_input_gives_no_chunks() {
        assert!(chunk_segments(&[], 1800.0).is_empty());
    }

    #[test]
    fn short_input_stays_whole() {
        let segments = minute_segments(20);
        let chunks = chunk_segments(&segments, 1800.0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 20);
    }

    #[test]
    fn ninety_five_minutes_make_four_windows() {
        let segments = minute_segments(95);
        let chunks = chunk_segments(&segments, 1800.0);

        assert_eq!(chunks.len(), 4);
        // Boundaries are aligned to segment starts at 0, 30, 60, 90 min.
        assert_eq!(chunks[0][0].start_time, 0.0);
        assert_eq!(chunks[1][0].start_time, 1800.0);
        assert_eq!(chunks[2][0].start_time, 3600.0);
        assert_eq!(chunks[3][0].start_time, 5400.0);
        assert_eq!(chunks[3].len(), 5);
    }

    #[test]
    fn chunks_preserve_segment_count_and_order() {
        let segments = minute_segments(130);
        let chunks = chunk_segments(&segments, 1800.0);

        let flattened: Vec<_> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, segments);
    }

    #[test]
    fn oversized_single_segment_is_its_own_window() {
        let segments = vec![
            ContentSegment::new("long", 0.0, 4000.0),
            ContentSegment::new("after", 4000.0, 4010.0),
        ];
        let chunks = chunk_segments(&segments, 1800.0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 1);
    }

    proptest! {
        #[test]
        fn partition_never_splits_or_reorders(
            durations in prop::collection::vec(1.0f64..120.0, 1..200),
            max_secs in 60.0f64..3600.0,
        ) {
            // Build an ordered segment sequence from random durations.
            let mut start = 0.0;
            let segments: Vec<ContentSegment> = durations
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    let segment = ContentSegment::new(format!("s{i}"), start, start + d);
                    start += d;
                    segment
                })
                .collect();

            let chunks = chunk_segments(&segments, max_secs);

            // Concatenation reproduces the input exactly.
            let flattened: Vec<_> = chunks.iter().flatten().cloned().collect();
            prop_assert_eq!(&flattened, &segments);

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert!(!chunk.is_empty());
                let window_start = chunk[0].start_time;
                // Every segment in a window starts within max_secs of
                // the window start.
                for segment in chunk {
                    prop_assert!(segment.start_time - window_start < max_secs);
                }
                // Each window after the first opens because its first
                // segment crossed the previous window's span.
                if i > 0 {
                    let previous_start = chunks[i - 1][0].start_time;
                    prop_assert!(window_start - previous_start >= max_secs);
                }
            }
        }
    }
}
