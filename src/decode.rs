//! Container decoding: any audio/video input to mono `f32` samples.
//!
//! Responsibilities:
//! - Probe the container and select a reasonable default audio track
//! - Decode packets, tolerating corrupt frames and treating IO errors as
//!   end-of-stream
//! - Downmix interleaved PCM to mono
//!
//! The output stays at the source sample rate; `resample` brings it to the
//! crate's target rate. Analysis here is whole-file (both the transcriber
//! and the chroma estimator want the complete buffer), so this module
//! decodes to a single `Vec<f32>` rather than streaming chunks.

use std::io::Read;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, Track};
use symphonia::core::io::{MediaSource, MediaSourceStream, MediaSourceStreamOptions, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an input stream to mono samples at the source sample rate.
///
/// Accepts a generic `Read` rather than a filename so callers can pass files,
/// stdin, or HTTP upload bodies. `hint_extension` can improve probe accuracy
/// for ambiguous inputs (e.g. "mp4", "webm", "ogg").
///
/// Returns the mono buffer and the source sample rate.
pub fn decode_to_mono<R>(reader: R, hint_extension: Option<&str>) -> Result<(Vec<f32>, u32)>
where
    R: Read + Send + 'static,
{
    // Symphonia's `MediaSource` requires `Sync`. We only move the reader into
    // the decode loop (never share it concurrently), so a mutex wrapper
    // satisfies the bound without constraining callers.
    let source = ReadOnlySource::new(LockedRead::new(reader));
    decode_impl(Box::new(source), hint_extension)
}

fn decode_impl(source: Box<dyn MediaSource>, hint_extension: Option<&str>) -> Result<(Vec<f32>, u32)> {
    let (mut format, track) = probe_and_pick_track(source, hint_extension)?;

    let src_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| anyhow!("selected track has no sample rate"))?;

    let decoder_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| anyhow!(e))
        .context("failed to create decoder for audio track")?;

    let mut mono = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let Some(packet) = next_packet(&mut format)? else {
            break;
        };

        // Ignore packets from non-audio tracks (video streams, subtitles).
        if packet.track_id() != track.id {
            continue;
        }

        decode_packet(&mut decoder, &packet, |decoded| {
            append_mono(decoded, &mut sample_buf, &mut mono)
        })?;
    }

    Ok((mono, src_rate))
}

/// Probe the container and pick a default audio track.
///
/// Track selection policy: the first track that looks decodable (codec !=
/// NULL) and has a known sample rate (required for resampling decisions
/// downstream).
fn probe_and_pick_track(
    source: Box<dyn MediaSource>,
    hint_extension: Option<&str>,
) -> Result<(Box<dyn FormatReader>, Track)> {
    let mss_opts = MediaSourceStreamOptions {
        // Symphonia expects a power-of-two buffer > 32KiB for good probing behavior.
        buffer_len: 256 * 1024,
    };
    let mss = MediaSourceStream::new(source, mss_opts);

    let mut hint = Hint::new();
    if let Some(ext) = hint_extension {
        hint.with_extension(ext);
    }

    let format_opts: FormatOptions = Default::default();
    let metadata_opts: MetadataOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| anyhow!(e))
        .context("failed to probe media stream")?;

    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| anyhow!("no audio track found"))?;

    Ok((format, track))
}

/// Read the next packet, treating IO errors as "end of stream".
fn next_packet(format: &mut Box<dyn FormatReader>) -> Result<Option<Packet>> {
    match format.next_packet() {
        Ok(p) => Ok(Some(p)),
        Err(SymphoniaError::IoError(_)) => Ok(None),
        Err(e) => Err(anyhow!(e)).context("failed reading packet"),
    }
}

/// Decode one packet.
///
/// Error handling policy (matters for real-world files):
/// - `DecodeError` → skip the bad frame, decoding can continue
/// - `IoError`     → treat as end-of-stream
/// - anything else → fatal
fn decode_packet(
    decoder: &mut Box<dyn Decoder>,
    packet: &Packet,
    mut on_decoded: impl FnMut(AudioBufferRef<'_>) -> Result<()>,
) -> Result<()> {
    match decoder.decode(packet) {
        Ok(buf) => on_decoded(buf),
        Err(SymphoniaError::DecodeError(_)) => Ok(()),
        Err(SymphoniaError::IoError(_)) => Ok(()),
        Err(e) => Err(anyhow!(e)).context("decoder failure"),
    }
}

/// Copy one decoded buffer into the mono accumulator.
fn append_mono(
    decoded: AudioBufferRef<'_>,
    sample_buf: &mut Option<SampleBuffer<f32>>,
    mono: &mut Vec<f32>,
) -> Result<()> {
    if sample_buf.is_none() {
        let spec = *decoded.spec();
        let duration = decoded.capacity() as u64;
        *sample_buf = Some(SampleBuffer::<f32>::new(duration, spec));
    }

    let buf = sample_buf
        .as_mut()
        .ok_or_else(|| anyhow!("sample buffer not initialized"))?;

    let channels = decoded.spec().channels.count();
    if channels == 0 {
        bail!("decoded audio had zero channels");
    }

    buf.copy_interleaved_ref(decoded);
    downmix_into(buf.samples(), channels, mono);
    Ok(())
}

/// Downmix interleaved samples into mono by averaging channels.
///
/// Policy: equal-weight average across channels (simple, predictable).
fn downmix_into(interleaved: &[f32], channels: usize, mono: &mut Vec<f32>) {
    if channels == 1 {
        mono.extend_from_slice(interleaved);
        return;
    }

    let frames = interleaved.len() / channels;
    mono.reserve(frames);

    for f in 0..frames {
        let base = f * channels;
        let mut acc = 0.0;
        for c in 0..channels {
            acc += interleaved[base + c];
        }
        mono.push(acc / channels as f32);
    }
}

struct LockedRead<R> {
    inner: Mutex<R>,
}

impl<R> LockedRead<R> {
    fn new(inner: R) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

impl<R: Read> Read for LockedRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| std::io::Error::other("decoder input mutex poisoned"))?
            .read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_single_channel_is_identity() {
        let mut mono = Vec::new();
        downmix_into(&[0.0, 1.0, -1.0], 1, &mut mono);
        assert_eq!(mono, vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn downmix_averages_channels() {
        // Two frames of stereo: (L=1, R=3), (L=-1, R=1) => mono: 2, 0
        let mut mono = Vec::new();
        downmix_into(&[1.0, 3.0, -1.0, 1.0], 2, &mut mono);
        assert_eq!(mono, vec![2.0, 0.0]);
    }

    #[test]
    fn downmix_appends_across_calls() {
        let mut mono = vec![9.0];
        downmix_into(&[1.0, 1.0], 2, &mut mono);
        assert_eq!(mono, vec![9.0, 1.0]);
    }

    #[test]
    fn empty_input_fails_probing() {
        let res = decode_to_mono(std::io::Cursor::new(Vec::new()), None);
        assert!(res.is_err());
    }
}
