use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::error::{AsrError, Result};

/// Sample rate the decoder pipeline expects (mono, 8kHz).
pub const TARGET_SAMPLE_RATE: u32 = 8000;

/// Decode an uploaded WAV file into mono samples at [`TARGET_SAMPLE_RATE`].
///
/// `filename` is only a hint used in log and error messages. Stereo input is
/// downmixed by summing channels; higher sample rates are decimated when the
/// ratio is integral.
pub fn decode_audio(bytes: &[u8], filename: &str) -> Result<Vec<i32>> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| AsrError::AudioDecode(format!("{}: {}", filename, e)))?;

    let spec = reader.spec();
    debug!(
        "Decoding {}: {}Hz, {} channels, {}-bit {:?}",
        filename, spec.sample_rate, spec.channels, spec.bits_per_sample, spec.sample_format
    );

    let samples: Vec<i32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(i32::from))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| AsrError::AudioDecode(format!("{}: {}", filename, e)))?,
        (SampleFormat::Int, 32) => reader
            .into_samples::<i32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| AsrError::AudioDecode(format!("{}: {}", filename, e)))?,
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i32))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| AsrError::AudioDecode(format!("{}: {}", filename, e)))?,
        (format, bits) => {
            return Err(AsrError::AudioDecode(format!(
                "{}: unsupported sample format {:?} ({} bit)",
                filename, format, bits
            )))
        }
    };

    let mono = if spec.channels > 1 {
        downmix_to_mono(&samples, spec.channels)
    } else {
        samples
    };

    resample(mono, spec.sample_rate, filename)
}

/// Sum interleaved channels into mono, clamping to the i32 sample range.
fn downmix_to_mono(samples: &[i32], channels: u16) -> Vec<i32> {
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i64 = frame.iter().map(|&s| s as i64).sum();
            sum.clamp(i32::MIN as i64, i32::MAX as i64) as i32
        })
        .collect()
}

/// Decimate to the target sample rate. Only integral downsampling ratios are
/// supported; anything else is rejected as undecodable input.
fn resample(samples: Vec<i32>, source_rate: u32, filename: &str) -> Result<Vec<i32>> {
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(samples);
    }

    if source_rate < TARGET_SAMPLE_RATE || source_rate % TARGET_SAMPLE_RATE != 0 {
        return Err(AsrError::AudioDecode(format!(
            "{}: unsupported sample rate {}Hz (expected {}Hz or an integral multiple)",
            filename, source_rate, TARGET_SAMPLE_RATE
        )));
    }

    let ratio = (source_rate / TARGET_SAMPLE_RATE) as usize;
    Ok(samples.into_iter().step_by(ratio).collect())
}
