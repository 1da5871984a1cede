//! High-level API for recovering chords and lyrics with Songbook.
//!
//! We expose a single, ergonomic entry point (`Songbook`) that wraps the
//! lower-level decoding, transcription, chroma, harmonization, and encoding
//! logic.
//!
//! The intent is:
//! - Whisper models load once per tier (expensive) and are reused.
//! - Both analyses (transcript and chroma) run over the same mono 16 kHz
//!   buffer, so their time bases line up by construction.
//! - Callers choose output format and behavior via `Opts`.
//! - Optional stages (source separation) plug in through a builder method
//!   instead of duplicated pipelines per variant.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::chroma::ChromaFeatures;
use crate::convert::extract_samples;
use crate::harmonize::{harmonize_transcript, ChordLine};
use crate::json_array_encoder::JsonArrayEncoder;
use crate::line_encoder::LineEncoder;
use crate::model_cache::ModelCache;
use crate::opts::Opts;
use crate::output_type::OutputType;
use crate::resample::TARGET_SAMPLE_RATE;
use crate::separator::{SeparatedStems, Separator};
use crate::sheet_encoder::SheetEncoder;
use crate::transcribe::get_segments;

/// The main high-level analysis entry point.
///
/// `Songbook` owns the long-lived resources an analysis needs:
/// - a `ModelCache` (loaded Whisper models, one per requested tier)
/// - optionally, a source separation collaborator
///
/// Typical usage:
/// - Construct once (cheap; models load lazily on first use).
/// - Call `analyze` many times with different inputs and outputs.
///
/// `analyze` takes `&mut self` because the model cache loads lazily.
pub struct Songbook {
    models: ModelCache,
    separator: Option<Box<dyn Separator>>,
}

impl Songbook {
    /// Create a new `Songbook` resolving models under `model_dir`.
    pub fn new(model_dir: impl AsRef<Path>) -> Result<Self> {
        let models = ModelCache::new(model_dir.as_ref())?;
        Ok(Self {
            models,
            separator: None,
        })
    }

    /// Attach a source-separation collaborator (builder style).
    pub fn with_separator(mut self, separator: Box<dyn Separator>) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Access the model cache.
    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    /// Analyze an input stream and write the rendered result to `w`.
    ///
    /// We accept a generic `Read` input rather than a filename so callers can
    /// pass files, stdin, or HTTP upload bodies. The input may be any
    /// container or codec symphonia can decode, video included.
    pub fn analyze<R, W>(&mut self, r: R, w: W, opts: &Opts) -> Result<()>
    where
        R: Read + Send + 'static,
        W: Write,
    {
        let lines = self.analyze_to_lines(r, opts)?;

        // Select an encoder based on the requested output type.
        // We keep this explicit (no trait objects) to avoid lifetime surprises.
        match opts.output_type {
            OutputType::Json => {
                let mut encoder = JsonArrayEncoder::new(w);
                let run_res = write_lines(&lines, &mut encoder);
                merge_run_and_close(run_res, encoder.close())
            }
            OutputType::Sheet => {
                let mut encoder = SheetEncoder::new(w);
                let run_res = write_lines(&lines, &mut encoder);
                merge_run_and_close(run_res, encoder.close())
            }
        }
    }

    /// Analyze an input stream and return the harmonized lines directly.
    ///
    /// This is the same pipeline as `analyze` minus the encoding step, for
    /// frontends that render lines live instead of (or in addition to)
    /// exporting a document.
    pub fn analyze_to_lines<R>(&mut self, r: R, opts: &Opts) -> Result<Vec<ChordLine>>
    where
        R: Read + Send + 'static,
    {
        let samples = extract_samples(r, None).context("failed to decode input audio")?;
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(tier = %opts.model_tier, "transcribing lyrics");
        let ctx = self.models.context(opts.model_tier)?;
        let segments = get_segments(ctx, opts, &samples)?;

        tracing::info!(segments = segments.len(), "analyzing chords");
        let features = ChromaFeatures::compute(&samples, TARGET_SAMPLE_RATE)?;

        Ok(harmonize_transcript(&features, &segments))
    }

    /// Split a recording into vocal and instrumental stems.
    ///
    /// Requires a separator configured via [`Songbook::with_separator`];
    /// without one this is a descriptive error, not a panic.
    pub fn separate(&self, audio: &Path, out_dir: &Path) -> Result<SeparatedStems> {
        let separator = self
            .separator
            .as_ref()
            .context("no separator configured; attach one with `with_separator`")?;
        separator.separate(audio, out_dir)
    }
}

fn write_lines(lines: &[ChordLine], encoder: &mut dyn LineEncoder) -> Result<()> {
    for line in lines {
        encoder.write_line(line)?;
    }
    Ok(())
}

fn merge_run_and_close(run_res: Result<()>, close_res: Result<()>) -> Result<()> {
    match (run_res, close_res) {
        (Ok(()), Ok(())) => Ok(()),
        (Ok(()), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => Err(err.context(close_err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separate_without_a_separator_is_a_descriptive_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let songbook = Songbook::new(dir.path())?;
        let err = songbook
            .separate(Path::new("song.wav"), Path::new("out"))
            .unwrap_err();
        assert!(err.to_string().contains("no separator configured"));
        Ok(())
    }

    #[test]
    fn merge_prefers_the_run_error() {
        let merged = merge_run_and_close(
            Err(anyhow::anyhow!("run failed")),
            Err(anyhow::anyhow!("close failed")),
        );
        let err = merged.unwrap_err();
        assert!(format!("{err:#}").contains("run failed"));
    }
}
