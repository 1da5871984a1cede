//! Whisper transcription: model loading and full-pass segment extraction.

use anyhow::{Context, Result};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperSegment,
};

use crate::logging::init_whisper_logging;
use crate::opts::Opts;
use crate::segments::Segment;

/// Load a Whisper model and return an initialized `WhisperContext`.
///
/// Model loading is centralized here so error handling and defaults stay
/// consistent across the CLI, the server, and the model cache.
pub fn get_context(model_path: &str) -> Result<WhisperContext> {
    init_whisper_logging();

    let ctx_params = WhisperContextParameters::default();
    let ctx = WhisperContext::new_with_params(model_path, ctx_params)
        .with_context(|| format!("failed to load model from path: {model_path}"))?;

    Ok(ctx)
}

/// Run a full transcription pass and collect ordered segments.
pub fn get_segments(ctx: &WhisperContext, opts: &Opts, samples: &[f32]) -> Result<Vec<Segment>> {
    let params = get_params(opts);

    let mut state = ctx
        .create_state()
        .context("failed to create whisper state")?;

    state
        .full(params, samples)
        .context("failed to run whisper full()")?;

    let mut segments = Vec::new();
    for whisper_segment in state.as_iter() {
        segments.push(to_segment(whisper_segment)?);
    }

    Ok(segments)
}

fn get_params<'a>(opts: &'a Opts) -> FullParams<'a, 'static> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: 1.0,
    });

    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(opts.translate_to_english);
    // `None` lets Whisper auto-detect the sung language.
    params.set_language(opts.language.as_deref());
    params.set_no_context(true);
    params.set_single_segment(false);
    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params
}

fn to_segment(segment: WhisperSegment) -> Result<Segment> {
    let text = segment
        .to_str()
        .context("failed to get segment text")?
        .to_owned();

    Ok(Segment {
        start_seconds: centiseconds_to_seconds(segment.start_timestamp()),
        end_seconds: centiseconds_to_seconds(segment.end_timestamp()),
        text,
    })
}

/// whisper.cpp reports timestamps in centiseconds (10 ms units).
fn centiseconds_to_seconds(value: i64) -> f32 {
    if value < 0 { 0.0 } else { value as f32 / 100.0 }
}
