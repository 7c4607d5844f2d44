pub mod analyser;
pub mod capture;
pub mod monitor;
pub mod source;

pub use analyser::SpectrumAnalyser;
pub use capture::{list_input_devices, MicCapture, MicLevelSource};
pub use monitor::{root_mean_square, scale_level, LevelMonitor, MonitorError, MonitorHandle};
pub use source::LevelSource;
