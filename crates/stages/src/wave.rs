//! WAV decoding shared by the audio stages

use std::path::Path;

use contracts::ContractError;

/// Decoded, mono-mixed audio samples.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Samples normalized to [-1, 1]
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioClip {
    /// Clip duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode a WAV file, mixing all channels down to mono.
///
/// `max_secs` caps how much audio is read; the stages working on a fixed
/// prefix (hook analysis, embeddings) pass a limit to bound memory.
pub fn decode_wav(
    stage: &str,
    path: &Path,
    max_secs: Option<f64>,
) -> Result<AudioClip, ContractError> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| ContractError::input_decode(stage, e.to_string()))?;
    let spec = reader.spec();

    let channels = spec.channels.max(1) as usize;
    let frame_limit = max_secs
        .map(|secs| (secs * spec.sample_rate as f64) as usize)
        .unwrap_or(usize::MAX);
    let sample_limit = frame_limit.saturating_mul(channels);

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .take(sample_limit)
            .collect::<Result<_, _>>()
            .map_err(|e| ContractError::input_decode(stage, e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .take(sample_limit)
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| ContractError::input_decode(stage, e.to_string()))?
        }
    };

    // Mixdown: average channels per frame
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(AudioClip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Read only the header and report the full clip duration in seconds.
pub fn wav_duration_secs(stage: &str, path: &Path) -> Result<f64, ContractError> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| ContractError::input_decode(stage, e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Ok(0.0);
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}
