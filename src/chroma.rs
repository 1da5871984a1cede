//! Chroma feature extraction.
//!
//! Converts a mono signal into a sequence of 12-bin pitch-class energy
//! frames paired with a time axis. Each STFT column is folded onto pitch
//! classes by mapping bin frequencies to MIDI note numbers, so every octave
//! of the same note contributes to the same bin.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{Error, Result};

/// Number of pitch classes per chroma frame (C, C#, ..., B).
pub const PITCH_CLASSES: usize = 12;

/// STFT window length in samples.
pub const FFT_SIZE: usize = 4096;

/// Analysis hop in samples. Frame `i` is timestamped at `i * HOP_LENGTH`.
pub const HOP_LENGTH: usize = 1024;

// Fold range: C1 up to C8. Bins outside contribute mostly noise at a
// 16 kHz analysis rate.
const MIN_FOLD_HZ: f32 = 32.70;
const MAX_FOLD_HZ: f32 = 4186.0;

/// Energy per pitch class for one analysis frame.
pub type ChromaFrame = [f32; PITCH_CLASSES];

/// A chroma matrix and its parallel time axis.
///
/// Invariant: `frames.len() == times.len()`, with `times` strictly
/// increasing. Constructors uphold this; `from_parts` rejects mismatched
/// inputs instead of letting indices silently misalign downstream.
#[derive(Debug, Clone, Default)]
pub struct ChromaFeatures {
    frames: Vec<ChromaFrame>,
    times: Vec<f32>,
}

impl ChromaFeatures {
    /// Build features from pre-computed parts, failing fast on a length
    /// mismatch.
    pub fn from_parts(frames: Vec<ChromaFrame>, times: Vec<f32>) -> Result<Self> {
        if frames.len() != times.len() {
            return Err(Error::ChromaAxisMismatch {
                frames: frames.len(),
                times: times.len(),
            });
        }
        Ok(Self { frames, times })
    }

    /// Compute chroma features from a mono signal.
    ///
    /// Inputs shorter than one STFT window produce an empty (still valid)
    /// feature set.
    pub fn compute(samples: &[f32], sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::msg("sample rate must be non-zero"));
        }

        let mut frames = Vec::new();
        let mut times = Vec::new();

        if samples.len() >= FFT_SIZE {
            let mut planner = FftPlanner::<f32>::new();
            let fft = planner.plan_fft_forward(FFT_SIZE);
            let window = hann_window(FFT_SIZE);
            let freq_resolution = sample_rate as f32 / FFT_SIZE as f32;

            let mut scratch = vec![Complex::new(0.0, 0.0); FFT_SIZE];
            let mut start = 0;
            while start + FFT_SIZE <= samples.len() {
                for (dst, (&sample, &win)) in scratch
                    .iter_mut()
                    .zip(samples[start..start + FFT_SIZE].iter().zip(window.iter()))
                {
                    *dst = Complex::new(sample * win, 0.0);
                }
                fft.process(&mut scratch);

                frames.push(fold_spectrum(&scratch, freq_resolution));
                times.push(start as f32 / sample_rate as f32);
                start += HOP_LENGTH;
            }
        }

        Self::from_parts(frames, times)
    }

    /// The chroma frames, one per analysis hop.
    pub fn frames(&self) -> &[ChromaFrame] {
        &self.frames
    }

    /// Frame timestamps in seconds, same length as [`Self::frames`].
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    /// Number of analysis frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frames were produced.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn hann_window(len: usize) -> Vec<f32> {
    let denom = (len - 1) as f32;
    (0..len)
        .map(|n| {
            let x = std::f32::consts::TAU * n as f32 / denom;
            0.5 * (1.0 - x.cos())
        })
        .collect()
}

/// Fold one FFT spectrum onto the 12 pitch classes.
///
/// Bin frequency maps to a MIDI note number (69 = A4 = 440 Hz); the note's
/// pitch class accumulates the bin's squared magnitude. DC and bins outside
/// the fold range are skipped.
fn fold_spectrum(spectrum: &[Complex<f32>], freq_resolution: f32) -> ChromaFrame {
    let mut frame = [0.0f32; PITCH_CLASSES];

    // Only the first half of the spectrum is unique for a real signal.
    for (bin, value) in spectrum.iter().enumerate().take(spectrum.len() / 2).skip(1) {
        let freq = bin as f32 * freq_resolution;
        if !(MIN_FOLD_HZ..=MAX_FOLD_HZ).contains(&freq) {
            continue;
        }

        let midi = 69.0 + 12.0 * (freq / 440.0).log2();
        let pitch_class = (midi.round() as i32).rem_euclid(PITCH_CLASSES as i32) as usize;

        frame[pitch_class] += value.norm_sqr();
    }

    frame
}
