use std::io::{Read, Seek, Write};

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::resample::TARGET_SAMPLE_RATE;

/// The WAV spec every file this crate writes (and accepts directly) uses:
/// mono, 16 kHz, signed 16-bit PCM.
pub fn target_wav_spec() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Load WAV audio from a reader and return normalized samples.
///
/// What we return: a `Vec<f32>` of mono samples normalized to `[-1.0, 1.0]`,
/// plus the `WavSpec` so callers keep access to metadata.
///
/// Format requirements: mono, at the target sample rate. Enforcing the
/// constraints here keeps everything downstream simple and predictable;
/// inputs in other formats go through the container decode path instead.
pub fn get_samples_from_wav_reader<R>(reader: R) -> Result<(Vec<f32>, WavSpec)>
where
    R: Read + Seek,
{
    let mut reader = WavReader::new(reader).context("failed to read WAV data from reader")?;
    let spec = reader.spec();

    if spec.channels != 1 {
        anyhow::bail!(
            "expected mono WAV (1 channel), got {} channels",
            spec.channels
        );
    }

    if spec.sample_rate != TARGET_SAMPLE_RATE {
        anyhow::bail!(
            "expected {} Hz sample rate, got {} Hz",
            TARGET_SAMPLE_RATE,
            spec.sample_rate
        );
    }

    // Normalize from i16 PCM to f32 in [-1.0, 1.0].
    let mut samples = Vec::new();
    for sample in reader.samples::<i16>() {
        let pcm = sample?;
        samples.push(pcm as f32 / i16::MAX as f32);
    }

    Ok((samples, spec))
}

/// Write normalized mono samples as a 16-bit PCM WAV at the target rate.
///
/// Samples outside `[-1.0, 1.0]` are clamped rather than wrapped.
pub fn write_mono_wav<W>(writer: W, samples: &[f32]) -> Result<()>
where
    W: Write + Seek,
{
    let mut wav = WavWriter::new(writer, target_wav_spec())
        .context("failed to start WAV output")?;

    for &sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        wav.write_sample(pcm)?;
    }

    wav.finalize().context("failed to finalize WAV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn wav_bytes(spec: WavSpec, samples: &[i16]) -> anyhow::Result<Vec<u8>> {
        let mut bytes = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut bytes, spec)?;
        for &s in samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        Ok(bytes.into_inner())
    }

    #[test]
    fn round_trips_through_write_and_read() -> anyhow::Result<()> {
        let samples = vec![0.0, 0.5, -0.5, 1.0, -1.0];

        let mut bytes = Cursor::new(Vec::new());
        write_mono_wav(&mut bytes, &samples)?;

        let (decoded, spec) = get_samples_from_wav_reader(Cursor::new(bytes.into_inner()))?;
        assert_eq!(spec, target_wav_spec());
        assert_eq!(decoded.len(), samples.len());
        for (got, want) in decoded.iter().zip(samples.iter()) {
            assert!((got - want).abs() < 1e-3, "got {got}, want {want}");
        }
        Ok(())
    }

    #[test]
    fn out_of_range_samples_clamp() -> anyhow::Result<()> {
        let mut bytes = Cursor::new(Vec::new());
        write_mono_wav(&mut bytes, &[2.0, -2.0])?;

        let (decoded, _) = get_samples_from_wav_reader(Cursor::new(bytes.into_inner()))?;
        assert!((decoded[0] - 1.0).abs() < 1e-3);
        assert!((decoded[1] + 1.0).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn stereo_input_is_rejected() -> anyhow::Result<()> {
        let spec = WavSpec {
            channels: 2,
            ..target_wav_spec()
        };
        let bytes = wav_bytes(spec, &[0, 0, 0, 0])?;
        let err = get_samples_from_wav_reader(Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("expected mono WAV"));
        Ok(())
    }

    #[test]
    fn wrong_sample_rate_is_rejected() -> anyhow::Result<()> {
        let spec = WavSpec {
            sample_rate: 44_100,
            ..target_wav_spec()
        };
        let bytes = wav_bytes(spec, &[0, 0])?;
        let err = get_samples_from_wav_reader(Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("16000 Hz"));
        Ok(())
    }
}
