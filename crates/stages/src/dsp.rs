//! Shared spectral helpers for the audio stages
//!
//! Frame-wise magnitude spectra, onset strength, tempo estimation, chroma
//! folding and band energies. All functions are deterministic.

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::wave::AudioClip;

/// Analysis frame length in samples
pub const FRAME_SIZE: usize = 1024;

/// Hop between consecutive frames in samples
pub const HOP_SIZE: usize = 512;

/// Frame-wise magnitude spectra (FRAME_SIZE/2 + 1 bins per frame).
pub fn magnitude_spectra(clip: &AudioClip) -> Vec<Vec<f32>> {
    if clip.samples.len() < FRAME_SIZE {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft: std::sync::Arc<dyn Fft<f32>> = planner.plan_fft_forward(FRAME_SIZE);

    let window: Vec<f32> = (0..FRAME_SIZE)
        .map(|i| {
            // Hann window
            let phase = i as f32 / (FRAME_SIZE - 1) as f32;
            0.5 - 0.5 * (2.0 * std::f32::consts::PI * phase).cos()
        })
        .collect();

    let bins = FRAME_SIZE / 2 + 1;
    let mut spectra = Vec::new();
    let mut buffer = vec![Complex::new(0.0f32, 0.0f32); FRAME_SIZE];

    let mut start = 0;
    while start + FRAME_SIZE <= clip.samples.len() {
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(clip.samples[start + i] * window[i], 0.0);
        }
        fft.process(&mut buffer);
        spectra.push(buffer[..bins].iter().map(|c| c.norm()).collect());
        start += HOP_SIZE;
    }

    spectra
}

/// Onset strength envelope: per-frame sum of positive spectral flux.
pub fn onset_envelope(spectra: &[Vec<f32>]) -> Vec<f32> {
    if spectra.len() < 2 {
        return Vec::new();
    }

    spectra
        .windows(2)
        .map(|pair| {
            pair[1]
                .iter()
                .zip(pair[0].iter())
                .map(|(cur, prev)| (cur - prev).max(0.0))
                .sum()
        })
        .collect()
}

/// Arithmetic mean; 0.0 for empty input.
pub fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64
}

/// Population variance; 0.0 for empty input.
pub fn variance(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values
        .iter()
        .map(|v| {
            let d = *v as f64 - m;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64
}

/// Tempo estimate from autocorrelation of the onset envelope.
///
/// Searches the 60-180 BPM band; returns (bpm, beat_strength) where
/// beat_strength is the normalized autocorrelation peak in [0, 1].
/// Returns (0.0, 0.0) when the envelope is too short to estimate.
pub fn estimate_tempo(envelope: &[f32], sample_rate: u32) -> (f64, f64) {
    if envelope.is_empty() || sample_rate == 0 {
        return (0.0, 0.0);
    }

    let frames_per_sec = sample_rate as f64 / HOP_SIZE as f64;
    let min_lag = (frames_per_sec * 60.0 / 180.0).floor().max(1.0) as usize;
    let max_lag = (frames_per_sec * 60.0 / 60.0).ceil() as usize;
    if envelope.len() <= max_lag {
        return (0.0, 0.0);
    }

    let m = mean(envelope);
    let centered: Vec<f64> = envelope.iter().map(|v| *v as f64 - m).collect();
    let energy: f64 = centered.iter().map(|v| v * v).sum();
    if energy <= f64::EPSILON {
        return (0.0, 0.0);
    }

    let mut best_lag = min_lag;
    let mut best_corr = f64::MIN;
    for lag in min_lag..=max_lag {
        let corr: f64 = centered[lag..]
            .iter()
            .zip(centered.iter())
            .map(|(a, b)| a * b)
            .sum();
        if corr > best_corr {
            best_corr = corr;
            best_lag = lag;
        }
    }

    let bpm = 60.0 * frames_per_sec / best_lag as f64;
    let strength = (best_corr / energy).clamp(0.0, 1.0);
    (bpm, strength)
}

/// Fold a magnitude spectrum into 12 pitch classes.
pub fn chroma(spectrum: &[f32], sample_rate: u32) -> [f32; 12] {
    let mut classes = [0.0f32; 12];
    if sample_rate == 0 {
        return classes;
    }

    let bin_hz = sample_rate as f32 / FRAME_SIZE as f32;
    for (k, magnitude) in spectrum.iter().enumerate().skip(1) {
        let freq = k as f32 * bin_hz;
        if !(25.0..8000.0).contains(&freq) {
            continue;
        }
        let midi = 69.0 + 12.0 * (freq / 440.0).log2();
        let class = (midi.round() as i32).rem_euclid(12) as usize;
        classes[class] += magnitude;
    }
    classes
}

/// Shannon entropy of a non-negative distribution (natural log).
pub fn entropy(weights: &[f32]) -> f64 {
    let total: f64 = weights.iter().map(|w| *w as f64).sum();
    if total <= f64::EPSILON {
        return 0.0;
    }
    -weights
        .iter()
        .filter(|w| **w > 0.0)
        .map(|w| {
            let p = *w as f64 / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Mean energy in `n_bands` log-spaced bands between 50 Hz and Nyquist,
/// averaged across all frames.
pub fn band_energies(spectra: &[Vec<f32>], sample_rate: u32, n_bands: usize) -> Vec<f64> {
    let mut bands = vec![0.0f64; n_bands];
    if spectra.is_empty() || sample_rate == 0 || n_bands == 0 {
        return bands;
    }

    let nyquist = sample_rate as f64 / 2.0;
    let low = 50.0f64;
    let ratio = (nyquist / low).ln();
    let bin_hz = sample_rate as f64 / FRAME_SIZE as f64;

    for spectrum in spectra {
        for (k, magnitude) in spectrum.iter().enumerate().skip(1) {
            let freq = k as f64 * bin_hz;
            if freq < low || freq >= nyquist {
                continue;
            }
            let pos = (freq / low).ln() / ratio;
            let band = ((pos * n_bands as f64) as usize).min(n_bands - 1);
            bands[band] += *magnitude as f64;
        }
    }

    let frames = spectra.len() as f64;
    for band in &mut bands {
        *band /= frames;
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_clip(freq: f32, secs: f32, sample_rate: u32) -> AudioClip {
        let total = (secs * sample_rate as f32) as usize;
        let samples = (0..total)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.5
            })
            .collect();
        AudioClip {
            samples,
            sample_rate,
        }
    }

    #[test]
    fn test_spectra_shape() {
        let clip = sine_clip(440.0, 1.0, 22050);
        let spectra = magnitude_spectra(&clip);
        assert!(!spectra.is_empty());
        assert_eq!(spectra[0].len(), FRAME_SIZE / 2 + 1);
    }

    #[test]
    fn test_sine_peaks_near_expected_bin() {
        let clip = sine_clip(440.0, 1.0, 22050);
        let spectra = magnitude_spectra(&clip);
        let frame = &spectra[spectra.len() / 2];
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        let expected = (440.0 * FRAME_SIZE as f32 / 22050.0).round() as usize;
        assert!(peak_bin.abs_diff(expected) <= 1, "peak bin {peak_bin}");
    }

    #[test]
    fn test_steady_tone_has_flat_onsets() {
        let clip = sine_clip(440.0, 1.0, 22050);
        let envelope = onset_envelope(&magnitude_spectra(&clip));
        // A steady tone has almost no positive flux after the attack
        let tail = &envelope[2..];
        assert!(mean(tail) < 1.0, "tail mean {}", mean(tail));
    }

    #[test]
    fn test_too_short_clip_yields_empty() {
        let clip = AudioClip {
            samples: vec![0.0; 100],
            sample_rate: 22050,
        };
        assert!(magnitude_spectra(&clip).is_empty());
        assert!(onset_envelope(&[]).is_empty());
        assert_eq!(estimate_tempo(&[], 22050), (0.0, 0.0));
    }

    #[test]
    fn test_tempo_of_pulse_train() {
        // 120 BPM click track: one impulse every 0.5 s
        let sample_rate = 22050u32;
        let mut samples = vec![0.0f32; sample_rate as usize * 6];
        let period = sample_rate as usize / 2;
        for click in samples.chunks_mut(period) {
            for (i, s) in click.iter_mut().take(400).enumerate() {
                *s = 0.9 * (1.0 - i as f32 / 400.0);
            }
        }
        let clip = AudioClip {
            samples,
            sample_rate,
        };
        let envelope = onset_envelope(&magnitude_spectra(&clip));
        let (bpm, strength) = estimate_tempo(&envelope, sample_rate);
        assert!((bpm - 120.0).abs() < 12.0, "bpm {bpm}");
        assert!(strength > 0.0);
    }

    #[test]
    fn test_entropy_bounds() {
        assert_eq!(entropy(&[]), 0.0);
        assert_eq!(entropy(&[1.0]), 0.0);
        // Uniform distribution maximizes entropy at ln(n)
        let uniform = entropy(&[1.0; 12]);
        assert!((uniform - (12.0f64).ln()).abs() < 1e-9);
    }

    #[test]
    fn test_band_energies_sum_positive_for_tone() {
        let clip = sine_clip(440.0, 1.0, 22050);
        let bands = band_energies(&magnitude_spectra(&clip), 22050, 64);
        assert_eq!(bands.len(), 64);
        assert!(bands.iter().sum::<f64>() > 0.0);
    }
}
