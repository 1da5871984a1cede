//! Resampling decoded mono audio to the crate's target rate.

use anyhow::{anyhow, bail, Context, Result};
use rubato::{Resampler, SincFixedIn, WindowFunction};

/// The target mono sample rate (Hz) shared by the transcriber and the chroma
/// estimator. Keeping both on one buffer keeps their time bases aligned.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

// How many source frames we feed rubato per `process()` call.
// Tradeoff: larger blocks = better throughput; smaller blocks = less padding
// waste on the final partial block.
const RESAMPLE_BLOCK_FRAMES: usize = 2048;

/// Resample a mono buffer from `src_rate` to [`TARGET_SAMPLE_RATE`].
///
/// Already-at-target input is returned unchanged. The final partial block is
/// zero-padded to rubato's fixed input size, so output length may exceed the
/// exact rate ratio by a fraction of a block.
pub fn resample_to_target(mono: Vec<f32>, src_rate: u32) -> Result<Vec<f32>> {
    if src_rate == 0 {
        bail!("source sample rate must be non-zero");
    }
    if src_rate == TARGET_SAMPLE_RATE || mono.is_empty() {
        return Ok(mono);
    }

    let mut rs = SincFixedIn::<f32>::new(
        TARGET_SAMPLE_RATE as f64 / src_rate as f64,
        2.0,
        rubato::SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: rubato::SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        },
        RESAMPLE_BLOCK_FRAMES,
        1, // mono
    )
    .map_err(|e| anyhow!(e))
    .context("failed to init resampler")?;

    let in_max = rs.input_frames_max();
    let mut out = Vec::with_capacity(
        (mono.len() as f64 * TARGET_SAMPLE_RATE as f64 / src_rate as f64) as usize + in_max,
    );

    let mut block = vec![0.0f32; in_max];
    for chunk in mono.chunks(in_max) {
        // rubato expects exact block sizes; pad the final chunk with zeros.
        block[..chunk.len()].copy_from_slice(chunk);
        block[chunk.len()..].fill(0.0);

        let resampled = rs
            .process(&[block.clone()], None)
            .map_err(|e| anyhow!(e))
            .context("resampler process failed")?;

        if resampled.len() != 1 {
            bail!("expected mono output from resampler");
        }
        out.extend_from_slice(&resampled[0]);
    }

    Ok(out)
}
