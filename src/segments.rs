use serde::Serialize;

/// A time-stamped transcript segment.
///
/// Times are seconds in the same time base as the chroma estimator's output
/// (both are derived from the same mono 16 kHz buffer). Segments arrive
/// ordered by start time from the transcriber, but nothing downstream
/// depends on that: the harmonizer treats each segment independently.
#[derive(Debug, Serialize, Clone)]
pub struct Segment {
    pub start_seconds: f32,
    pub end_seconds: f32,
    pub text: String,
}
