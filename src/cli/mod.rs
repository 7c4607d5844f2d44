use crate::audio::{self, LevelMonitor, MicCapture};
use crate::config::Config;
use crate::room::{self, JoinOptions};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser, Debug)]
#[command(name = "quickroom")]
#[command(about = "LiveKit room demo: token service, room join and mic level meter", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Join a room and meter the microphone while connected
    Join(JoinCliArgs),
    /// Meter the microphone input level without joining a room
    Meter(MeterCliArgs),
    /// List available audio input devices
    Devices,
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct JoinCliArgs {
    /// Participant identity to join as
    #[arg(short, long)]
    pub identity: String,
    /// Name of the room to join
    #[arg(short, long)]
    pub room: String,
    /// Token server base URL
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub server: String,
    /// Input device name (overrides the config file)
    #[arg(short, long)]
    pub device: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct MeterCliArgs {
    /// Input device name (overrides the config file)
    #[arg(short, long)]
    pub device: Option<String>,
    /// Upper bound of the reported level scale
    #[arg(long)]
    pub max_level: Option<u16>,
}

pub async fn handle_join_command(args: JoinCliArgs) -> Result<()> {
    let config = Config::load()?;

    room::run_join(JoinOptions {
        identity: args.identity,
        room: args.room,
        server: args.server,
        input_device: args.device.or(config.audio.input_device),
        meter_height: i32::from(config.audio.meter_height),
    })
    .await
}

pub async fn handle_meter_command(args: MeterCliArgs) -> Result<()> {
    let config = Config::load()?;
    let device = args.device.or(config.audio.input_device);
    let max_level = i32::from(args.max_level.unwrap_or(config.audio.meter_height));

    let capture = MicCapture::open(device.as_deref())?;
    println!(
        "Metering input level on {}, press Ctrl-C to stop",
        capture.device_name()
    );

    let meter = level_meter(max_level);
    let bar = meter.clone();
    let mut monitor = LevelMonitor::new();
    monitor.start(capture.level_source(), max_level, move |level| {
        bar.set_position(level.max(0) as u64);
    })?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for Ctrl-C")?;

    monitor.stop();
    meter.finish_and_clear();
    capture.close();

    Ok(())
}

pub fn handle_devices_command() -> Result<()> {
    let devices = audio::list_input_devices()?;
    if devices.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }

    println!("Available input devices:\n");
    for (index, name) in devices.iter().enumerate() {
        println!("{}: {}", index, name);
    }

    println!("\nSelect one with `quickroom meter --device <name>` or via the config file.");

    Ok(())
}

/// Terminal level meter; the bar fills up to the reported level.
pub(crate) fn level_meter(max_level: i32) -> ProgressBar {
    let bar = ProgressBar::new(max_level.max(1) as u64);
    bar.set_style(
        ProgressStyle::with_template("mic [{bar:40.green}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_position(0);
    bar
}
