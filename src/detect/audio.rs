//! Background-speech detector.
//!
//! Computes frequency-domain energy over the supplied buffer and compares
//! the speech-band share against a sensitivity-scaled threshold. Missing
//! audio is the caller's signal to skip this detector entirely.

use num_complex::Complex32;
use rustfft::{num_traits::Zero, FftPlanner};

use crate::detect::result::{ViolationKind, Warning};
use crate::frame::AudioChunk;

/// Telephone-band limits; where speech energy concentrates.
const SPEECH_BAND_LOW_HZ: f32 = 300.0;
const SPEECH_BAND_HIGH_HZ: f32 = 3400.0;

/// Normalized energy in the speech band.
///
/// For a full-buffer sine of amplitude `a` inside the band this evaluates to
/// approximately `a^2 / 2`; silence is 0. The buffer is zero-padded to the
/// next power of two for the FFT.
pub fn speech_band_energy(chunk: &AudioChunk) -> f32 {
    let samples = chunk.samples();
    let m = samples.len();
    let n = m.next_power_of_two();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);

    let mut buffer: Vec<Complex32> = samples
        .iter()
        .map(|&value| Complex32::new(value, 0.0))
        .collect();
    buffer.resize(n, Complex32::zero());
    fft.process(&mut buffer);

    let bin_hz = chunk.sample_rate as f32 / n as f32;
    let low_bin = (SPEECH_BAND_LOW_HZ / bin_hz).ceil() as usize;
    let high_bin = ((SPEECH_BAND_HIGH_HZ / bin_hz).floor() as usize).min(n / 2);
    if low_bin > high_bin {
        return 0.0;
    }

    let band_power: f32 = buffer[low_bin..=high_bin]
        .iter()
        .map(|value| value.norm_sqr())
        .sum();

    // One-sided spectrum, normalized so the result is independent of buffer
    // length for an in-band tone.
    2.0 * band_power / (m as f32 * n as f32)
}

/// At most one warning per call, when energy is strictly above the threshold.
pub(crate) fn evaluate(chunk: &AudioChunk, threshold: f32) -> Option<Warning> {
    let energy = speech_band_energy(chunk);
    if energy > threshold {
        Some(Warning::new(
            ViolationKind::BackgroundSpeech,
            format!(
                "background speech detected (energy {:.4}) - keep the room silent",
                energy
            ),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn tone(freq_hz: f32, amplitude: f32, len: usize) -> AudioChunk {
        let samples = (0..len)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * freq_hz * i as f32 / RATE as f32).sin()
            })
            .collect();
        AudioChunk::new(samples, RATE).unwrap()
    }

    #[test]
    fn silence_has_zero_energy() {
        let chunk = AudioChunk::new(vec![0.0; 1024], RATE).unwrap();
        assert_eq!(speech_band_energy(&chunk), 0.0);
    }

    #[test]
    fn in_band_tone_energy_tracks_amplitude() {
        // 1 kHz tone, amplitude 0.5: energy ~ 0.125.
        let chunk = tone(1_000.0, 0.5, 1024);
        let energy = speech_band_energy(&chunk);
        assert!((energy - 0.125).abs() < 0.02, "energy was {}", energy);
    }

    #[test]
    fn out_of_band_tone_contributes_little() {
        // 62.5 Hz sits on an exact bin below the band at n=1024.
        let chunk = tone(62.5, 0.5, 1024);
        let energy = speech_band_energy(&chunk);
        assert!(energy < 0.01, "energy was {}", energy);
    }

    #[test]
    fn threshold_is_strict() {
        let chunk = tone(1_000.0, 0.5, 1024);
        let energy = speech_band_energy(&chunk);

        assert!(evaluate(&chunk, energy).is_none());
        assert!(evaluate(&chunk, energy * 0.9).is_some());
    }

    #[test]
    fn warning_is_emitted_exactly_once_per_call() {
        let chunk = tone(1_000.0, 0.5, 1024);
        let warning = evaluate(&chunk, 0.01).expect("above threshold");
        assert_eq!(warning.kind, ViolationKind::BackgroundSpeech);
    }
}
