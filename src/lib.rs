//! `songbook` — recover time-aligned lyrics and chords from sung recordings.
//!
//! This crate provides:
//! - Audio/video decoding into a normalized mono buffer
//! - Whisper transcription with a per-tier model cache
//! - Chroma feature extraction and per-line chord estimation
//! - Pluggable output encoders (Markdown chord sheet, JSON)
//! - An audio extraction utility and an optional source-separation seam
//!
//! The library is designed to be used by both CLI tools and long-running services,
//! with an emphasis on clarity, streaming output, and minimal surprises.

// High-level API (most consumers should start here).
pub mod opts;
pub mod songbook;

// The core: chord classification and segment harmonization.
pub mod chord;
pub mod chroma;
pub mod harmonize;

// Transcription: Whisper context management and segment extraction.
pub mod model_cache;
pub mod model_tier;
pub mod segments;
pub mod transcribe;

// Audio preprocessing: container decode, resample, WAV IO, extraction.
pub mod convert;
pub mod decode;
pub mod resample;
pub mod wav;

// Optional source separation.
pub mod separator;

// Output selection and encoder interfaces.
pub mod line_encoder;
pub mod output_type;

// Output encoders that serialize chord lines into various formats.
pub mod json_array_encoder;
pub mod sheet_encoder;

// Logging configuration and control.
pub mod logging;

mod error;

pub use error::{Error, Result};
