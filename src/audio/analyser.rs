//! Frequency-domain analysis of live audio.
//!
//! A fixed 1024-sample Blackman-windowed FFT with temporal smoothing,
//! producing byte magnitudes scaled across a -100..-30 dB range. One
//! analyser per capture; the monitor polls it through `LevelSource`.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Analysis window size in samples.
pub const FFT_SIZE: usize = 1024;

/// Default temporal smoothing constant applied to linear magnitudes.
pub const SMOOTHING: f32 = 0.5;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothing: f32,
}

impl SpectrumAnalyser {
    pub fn new() -> Self {
        Self::with_smoothing(SMOOTHING)
    }

    pub fn with_smoothing(smoothing: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        Self {
            fft,
            window: blackman_window(FFT_SIZE),
            smoothed: vec![0.0; FFT_SIZE / 2],
            buffer: vec![Complex::default(); FFT_SIZE],
            smoothing,
        }
    }

    /// Number of frequency bins an analysis produces.
    pub fn bin_count(&self) -> usize {
        FFT_SIZE / 2
    }

    /// Analyse the most recent window of time-domain samples, overwriting
    /// `out` with one byte magnitude per frequency bin.
    ///
    /// Fewer than `FFT_SIZE` samples are treated as silence-padded at the
    /// front; `out` must hold `bin_count()` bytes.
    pub fn analyse(&mut self, samples: &[f32], out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.bin_count());

        let tail = &samples[samples.len().saturating_sub(FFT_SIZE)..];
        let pad = FFT_SIZE - tail.len();

        for slot in self.buffer.iter_mut().take(pad) {
            *slot = Complex::default();
        }
        for ((slot, &sample), &weight) in self
            .buffer
            .iter_mut()
            .skip(pad)
            .zip(tail)
            .zip(&self.window[pad..])
        {
            *slot = Complex::new(sample * weight, 0.0);
        }

        self.fft.process(&mut self.buffer);

        for (bin, (byte, smoothed)) in out.iter_mut().zip(self.smoothed.iter_mut()).enumerate() {
            let magnitude = self.buffer[bin].norm() / FFT_SIZE as f32;
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;
            *byte = to_byte(*smoothed);
        }
    }
}

impl Default for SpectrumAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a linear magnitude onto a byte through the decibel range.
fn to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 * (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    scaled.clamp(0.0, 255.0) as u8
}

fn blackman_window(len: usize) -> Vec<f32> {
    use std::f32::consts::PI;

    let alpha = 0.16;
    let a0 = (1.0 - alpha) / 2.0;
    let a1 = 0.5;
    let a2 = alpha / 2.0;

    (0..len)
        .map(|n| {
            let x = n as f32 / len as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}
