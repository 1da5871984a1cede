//! Segment harmonization: reconcile transcript timing with chroma frames.
//!
//! The transcriber and the chroma estimator sample time independently —
//! word-level segment boundaries on one side, fixed analysis hops on the
//! other. This module joins the two per segment: slice the chroma timeline
//! to the segment's span, sample it at a bounded number of points, classify
//! each sample, and collapse consecutive repeats into a short chord
//! sequence for display.

use serde::Serialize;

use crate::chord::{classify, ChordLabel};
use crate::chroma::ChromaFeatures;
use crate::segments::Segment;

/// Upper bound on chords attached to a single line.
pub const MAX_CHORDS_PER_LINE: usize = 4;

/// One display line: a `[MM:SS]` timestamp, at most four chords with no
/// two adjacent equal, and the trimmed lyric text.
#[derive(Debug, Clone, Serialize)]
pub struct ChordLine {
    pub timestamp: String,
    pub chords: Vec<ChordLabel>,
    pub text: String,
}

/// Harmonize one transcript segment against the chroma timeline.
///
/// Degenerate segments (zero or inverted span, or a span wholly outside the
/// analyzed range) yield an empty chord list; that is valid output, not an
/// error.
pub fn harmonize_segment(features: &ChromaFeatures, segment: &Segment) -> ChordLine {
    let times = features.times();
    let idx_start = insertion_point(times, segment.start_seconds);
    let idx_end = insertion_point(times, segment.end_seconds);

    // Stride so the walk below touches roughly four frame positions no
    // matter how long the segment is.
    let span = idx_end.saturating_sub(idx_start);
    let stride = (span / MAX_CHORDS_PER_LINE).max(1);

    let mut chords: Vec<ChordLabel> = Vec::new();
    let mut idx = idx_start;
    while idx < idx_end && chords.len() < MAX_CHORDS_PER_LINE {
        let label = classify(&features.frames()[idx]);
        // Run-length dedup only: a chord may reappear non-adjacently.
        if chords.last() != Some(&label) {
            chords.push(label);
        }
        idx += stride;
    }

    ChordLine {
        timestamp: format_timestamp(segment.start_seconds),
        chords,
        text: segment.text.trim().to_owned(),
    }
}

/// Harmonize a whole transcript, preserving segment order.
///
/// The chroma invariant (matrix and time axis the same length) is upheld by
/// [`ChromaFeatures`] construction, so this is a straight ordered map; each
/// segment is independent of its neighbors.
pub fn harmonize_transcript(features: &ChromaFeatures, segments: &[Segment]) -> Vec<ChordLine> {
    segments
        .iter()
        .map(|segment| harmonize_segment(features, segment))
        .collect()
}

/// First index whose timestamp is `>= t`; `0` before the axis, `len` after.
fn insertion_point(times: &[f32], t: f32) -> usize {
    times.partition_point(|&x| x < t)
}

/// Format seconds as `[MM:SS]`, truncating fractional seconds.
pub fn format_timestamp(seconds: f32) -> String {
    let whole = seconds.max(0.0).floor() as u64;
    format!("[{:02}:{:02}]", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chroma::{ChromaFrame, PITCH_CLASSES};

    // A frame that classifies to the given root, major or minor.
    fn chord_frame(root: usize, minor: bool) -> ChromaFrame {
        let mut frame = [0.0; PITCH_CLASSES];
        frame[root] = 1.0;
        if minor {
            frame[(root + 3) % PITCH_CLASSES] = 0.5;
        } else {
            frame[(root + 4) % PITCH_CLASSES] = 0.5;
        }
        frame
    }

    fn features(frames: Vec<ChromaFrame>, times: Vec<f32>) -> ChromaFeatures {
        ChromaFeatures::from_parts(frames, times).expect("valid test features")
    }

    fn segment(start: f32, end: f32, text: &str) -> Segment {
        Segment {
            start_seconds: start,
            end_seconds: end,
            text: text.to_owned(),
        }
    }

    fn labels(line: &ChordLine) -> Vec<String> {
        line.chords.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn three_frame_scenario_samples_up_to_the_exclusive_end() {
        // G at 0.0 and 1.0, Em at 0.5; the frame at idx_end is never visited.
        let feats = features(
            vec![chord_frame(7, false), chord_frame(4, true), chord_frame(7, false)],
            vec![0.0, 0.5, 1.0],
        );
        let line = harmonize_segment(&feats, &segment(0.0, 1.0, "hello"));

        assert_eq!(labels(&line), vec!["G", "Em"]);
        assert_eq!(line.timestamp, "[00:00]");
        assert_eq!(line.text, "hello");
    }

    #[test]
    fn adjacent_repeats_collapse() {
        let feats = features(
            vec![
                chord_frame(0, false),
                chord_frame(0, false),
                chord_frame(0, false),
                chord_frame(9, true),
            ],
            vec![0.0, 0.25, 0.5, 0.75],
        );
        let line = harmonize_segment(&feats, &segment(0.0, 2.0, "x"));
        assert_eq!(labels(&line), vec!["C", "Am"]);
    }

    #[test]
    fn chord_can_reappear_non_adjacently() {
        let feats = features(
            vec![chord_frame(0, false), chord_frame(5, false), chord_frame(0, false)],
            vec![0.0, 0.5, 1.0],
        );
        let line = harmonize_segment(&feats, &segment(0.0, 2.0, "x"));
        assert_eq!(labels(&line), vec!["C", "F", "C"]);
    }

    #[test]
    fn output_is_capped_at_four_chords() {
        // Seven alternating frames: floor division yields stride 1, so the
        // walk visits every frame and the cap has to hold on its own.
        let mut frames = Vec::new();
        let mut times = Vec::new();
        for i in 0..7 {
            frames.push(chord_frame(if i % 2 == 0 { 0 } else { 7 }, false));
            times.push(i as f32 * 0.1);
        }
        let feats = features(frames, times);
        let line = harmonize_segment(&feats, &segment(0.0, 10.0, "x"));
        assert_eq!(line.chords.len(), MAX_CHORDS_PER_LINE);
        for pair in line.chords.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn long_segments_stride_across_the_span() {
        // Eight frames, stride 2: indices 0, 2, 4, 6 are sampled.
        let mut frames = Vec::new();
        let mut times = Vec::new();
        let roots = [0, 2, 4, 5, 7, 9, 11, 0];
        for (i, &root) in roots.iter().enumerate() {
            frames.push(chord_frame(root, false));
            times.push(i as f32 * 0.1);
        }
        let feats = features(frames, times);
        let line = harmonize_segment(&feats, &segment(0.0, 10.0, "x"));
        assert_eq!(labels(&line), vec!["C", "E", "G", "B"]);
    }

    #[test]
    fn zero_width_segment_yields_no_chords() {
        let feats = features(vec![chord_frame(0, false)], vec![0.0]);
        let line = harmonize_segment(&feats, &segment(0.5, 0.5, "quiet"));
        assert!(line.chords.is_empty());
        assert_eq!(line.text, "quiet");
    }

    #[test]
    fn inverted_segment_yields_no_chords() {
        let feats = features(
            vec![chord_frame(0, false), chord_frame(7, false)],
            vec![0.0, 0.5],
        );
        let line = harmonize_segment(&feats, &segment(0.5, 0.0, "x"));
        assert!(line.chords.is_empty());
    }

    #[test]
    fn segment_past_the_axis_yields_no_chords() {
        let feats = features(
            vec![chord_frame(0, false), chord_frame(7, false)],
            vec![0.0, 0.5],
        );
        let line = harmonize_segment(&feats, &segment(100.0, 200.0, "x"));
        assert!(line.chords.is_empty());
        assert_eq!(line.timestamp, "[01:40]");
    }

    #[test]
    fn empty_axis_is_tolerated() {
        let feats = ChromaFeatures::default();
        let line = harmonize_segment(&feats, &segment(0.0, 1.0, "x"));
        assert!(line.chords.is_empty());
    }

    #[test]
    fn transcript_order_and_length_are_preserved() {
        let feats = features(
            vec![chord_frame(0, false), chord_frame(7, false)],
            vec![0.0, 0.5],
        );
        let segments = vec![
            segment(0.0, 0.4, "one"),
            segment(0.4, 0.9, "two"),
            segment(0.9, 1.5, "three"),
        ];
        let lines = harmonize_transcript(&feats, &segments);
        assert_eq!(lines.len(), segments.len());
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn text_is_trimmed() {
        let feats = ChromaFeatures::default();
        let line = harmonize_segment(&feats, &segment(0.0, 0.0, "  hello world \n"));
        assert_eq!(line.text, "hello world");
    }

    #[test]
    fn timestamp_truncates_and_zero_pads() {
        assert_eq!(format_timestamp(125.7), "[02:05]");
        assert_eq!(format_timestamp(0.0), "[00:00]");
        assert_eq!(format_timestamp(59.999), "[00:59]");
        assert_eq!(format_timestamp(600.0), "[10:00]");
        assert_eq!(format_timestamp(-3.0), "[00:00]");
    }
}
