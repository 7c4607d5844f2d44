//! Microphone input level monitoring.
//!
//! Polls a live capture's frequency-domain snapshot on a fixed tick,
//! reduces it to a bounded integer level and reports the level through a
//! callback only when it changes. The loop runs as a spawned task owning
//! all of its state; a handle cancels it cooperatively.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::source::LevelSource;

/// Tick period of the polling loop, close to one frame at 60 Hz.
pub const TICK_PERIOD: Duration = Duration::from_millis(16);

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("max_level must be at least 1, got {0}")]
    InvalidMaxLevel(i32),
}

/// Cancellation handle for a running monitor loop.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    cancel: CancellationToken,
}

impl MonitorHandle {
    /// Stop the loop. Idempotent; a tick already in flight completes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Owns at most one polling loop over a live audio source.
///
/// Starting a new loop cancels the previous one, so two loops never sample
/// the same source concurrently. Dropping the monitor stops the loop.
pub struct LevelMonitor {
    period: Duration,
    active: Option<MonitorHandle>,
}

impl LevelMonitor {
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            active: None,
        }
    }

    /// Start polling `source`, reporting each changed level through
    /// `on_level`. Levels scale up to `max_level`, which must be at least 1.
    pub fn start<S, F>(
        &mut self,
        source: S,
        max_level: i32,
        on_level: F,
    ) -> Result<MonitorHandle, MonitorError>
    where
        S: LevelSource + Send + 'static,
        F: FnMut(i32) + Send + 'static,
    {
        if max_level < 1 {
            return Err(MonitorError::InvalidMaxLevel(max_level));
        }

        self.stop();

        let handle = MonitorHandle {
            cancel: CancellationToken::new(),
        };
        let task = MonitorTask::new(source, max_level, on_level);
        tokio::spawn(task.run(handle.cancel.clone(), self.period));

        self.active = Some(handle.clone());
        Ok(handle)
    }

    /// Cancel the active loop, if any. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }
}

impl Default for LevelMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LevelMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Per-loop state, owned by the spawned task.
struct MonitorTask<S, F> {
    source: S,
    max_level: i32,
    on_level: F,
    spectrum: Vec<u8>,
    last: Option<i32>,
    ended: bool,
}

impl<S, F> MonitorTask<S, F>
where
    S: LevelSource + Send + 'static,
    F: FnMut(i32) + Send + 'static,
{
    fn new(source: S, max_level: i32, on_level: F) -> Self {
        let bins = source.bin_count();
        Self {
            source,
            max_level,
            on_level,
            spectrum: vec![0; bins],
            last: None,
            ended: false,
        }
    }

    async fn run(mut self, cancel: CancellationToken, period: Duration) {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick(),
            }
        }

        debug!("level monitor loop stopped");
    }

    fn tick(&mut self) {
        if self.ended || self.source.is_ended() {
            // An ended track never comes back; report silence on every
            // tick until the monitor is stopped.
            self.ended = true;
            (self.on_level)(0);
            return;
        }

        self.source.fill_spectrum(&mut self.spectrum);
        let level = scale_level(root_mean_square(&self.spectrum), self.max_level);

        if self.last != Some(level) {
            self.last = Some(level);
            (self.on_level)(level);
        }
    }
}

/// Root mean square of a byte-magnitude snapshot.
pub fn root_mean_square(samples: &[u8]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Map an RMS magnitude onto a log2 scale topping out at `max_level`.
///
/// Uses `ceil`, not `round`: a level boundary is crossed as soon as the
/// scaled log value passes the previous integer. Zero RMS is level 0.
pub fn scale_level(rms: f64, max_level: i32) -> i32 {
    if rms <= 0.0 {
        return 0;
    }
    (f64::from(max_level) * rms.log2() / 8.0).ceil() as i32
}
