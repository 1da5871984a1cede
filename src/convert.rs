//! Audio extraction: any supported container or codec to mono 16 kHz WAV.
//!
//! This is the conversion utility of the pipeline — pull the audio out of a
//! video (or transcode an audio file) into the exact format the analysis
//! consumes: mono, 16-bit PCM, 16 kHz.

use std::io::{Read, Seek, Write};

use anyhow::{Context, Result};

use crate::decode::decode_to_mono;
use crate::resample::resample_to_target;
use crate::wav::write_mono_wav;

/// Decode `reader`, downmix and resample, and write a mono 16 kHz 16-bit WAV.
///
/// `hint_extension` can improve container probing for ambiguous inputs.
/// Returns the number of samples written.
pub fn extract_audio<R, W>(reader: R, hint_extension: Option<&str>, writer: W) -> Result<u64>
where
    R: Read + Send + 'static,
    W: Write + Seek,
{
    let samples = extract_samples(reader, hint_extension)?;
    write_mono_wav(writer, &samples).context("failed to write extracted audio")?;
    Ok(samples.len() as u64)
}

/// Decode `reader` to normalized mono samples at the target rate.
pub fn extract_samples<R>(reader: R, hint_extension: Option<&str>) -> Result<Vec<f32>>
where
    R: Read + Send + 'static,
{
    let (mono, src_rate) = decode_to_mono(reader, hint_extension)?;
    tracing::debug!(
        src_rate,
        samples = mono.len(),
        "decoded input to mono source-rate audio"
    );
    resample_to_target(mono, src_rate)
}
