//! Microphone capture via cpal.
//!
//! The stream callback keeps only the most recent analysis window of
//! samples; spectra are computed on demand when the level monitor polls.
//! A stream error or an explicit close latches the ended flag, the native
//! counterpart of a hardware track reporting itself ended.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use super::analyser::{SpectrumAnalyser, FFT_SIZE};
use super::source::LevelSource;

pub struct MicCapture {
    _stream: cpal::Stream,
    samples: Arc<Mutex<Vec<f32>>>,
    ended: Arc<AtomicBool>,
    device_name: String,
}

impl MicCapture {
    /// Open an input stream on the named device, or the default input
    /// device when `device_name` is `None`, and start capturing.
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(wanted) => host
                .input_devices()
                .context("Failed to enumerate input devices")?
                .find(|device| device.name().map(|name| name == wanted).unwrap_or(false))
                .with_context(|| format!("Input device '{wanted}' not found"))?,
            None => host
                .default_input_device()
                .context("No input device available")?,
        };

        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        info!("Capturing mic input from device: {}", name);

        let sample_rate = device
            .default_input_config()
            .context("Failed to query the default input config")?
            .sample_rate();
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let samples = Arc::new(Mutex::new(Vec::with_capacity(FFT_SIZE)));
        let ended = Arc::new(AtomicBool::new(false));

        let tail = samples.clone();
        let ended_on_error = ended.clone();
        let err_fn = move |err| {
            error!("Mic stream error: {}", err);
            ended_on_error.store(true, Ordering::SeqCst);
        };

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| push_tail(&tail, data),
            err_fn,
            None,
        )?;
        stream.play()?;

        Ok(Self {
            _stream: stream,
            samples,
            ended,
            device_name: name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// A `Send` handle onto this capture for the level monitor: the shared
    /// sample tail plus an owned analyser.
    pub fn level_source(&self) -> MicLevelSource {
        MicLevelSource {
            samples: self.samples.clone(),
            ended: self.ended.clone(),
            analyser: SpectrumAnalyser::new(),
            window: Vec::with_capacity(FFT_SIZE),
        }
    }

    /// Stop capturing. Monitors still polling this capture see it as ended.
    pub fn close(self) {
        debug!("Closing mic capture on {}", self.device_name);
        self.ended.store(true, Ordering::SeqCst);
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

/// Append captured samples, keeping only the latest analysis window.
fn push_tail(shared: &Mutex<Vec<f32>>, data: &[f32]) {
    let Ok(mut tail) = shared.lock() else {
        return;
    };
    tail.extend_from_slice(data);
    let excess = tail.len().saturating_sub(FFT_SIZE);
    if excess > 0 {
        tail.drain(..excess);
    }
}

pub struct MicLevelSource {
    samples: Arc<Mutex<Vec<f32>>>,
    ended: Arc<AtomicBool>,
    analyser: SpectrumAnalyser,
    window: Vec<f32>,
}

impl LevelSource for MicLevelSource {
    fn fill_spectrum(&mut self, out: &mut [u8]) {
        self.window.clear();
        if let Ok(tail) = self.samples.lock() {
            self.window.extend_from_slice(&tail);
        }
        self.analyser.analyse(&self.window, out);
    }

    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }
}

/// Names of the available audio input devices.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .context("Failed to enumerate input devices")?;

    Ok(devices
        .map(|device| device.name().unwrap_or_else(|_| "unknown".to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_tail_keeps_only_the_latest_window() {
        let shared = Mutex::new(Vec::new());

        push_tail(&shared, &vec![0.25; FFT_SIZE]);
        push_tail(&shared, &vec![0.5; 100]);

        let tail = shared.lock().unwrap();
        assert_eq!(tail.len(), FFT_SIZE);
        assert_eq!(tail[FFT_SIZE - 1], 0.5);
        assert_eq!(tail[FFT_SIZE - 101], 0.25);
    }

    #[test]
    fn test_push_tail_handles_oversized_chunks() {
        let shared = Mutex::new(Vec::new());

        push_tail(&shared, &vec![0.1; FFT_SIZE * 3]);

        assert_eq!(shared.lock().unwrap().len(), FFT_SIZE);
    }
}
