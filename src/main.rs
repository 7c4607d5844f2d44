use anyhow::Result;
use clap::Parser;
use quickroom::{
    app,
    cli::{
        handle_devices_command, handle_join_command, handle_meter_command, Cli, CliCommand,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("Quickroom {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Join(args)) => {
            handle_join_command(args).await?;
            return Ok(());
        }
        Some(CliCommand::Meter(args)) => {
            handle_meter_command(args).await?;
            return Ok(());
        }
        Some(CliCommand::Devices) => {
            handle_devices_command()?;
            return Ok(());
        }
        None => {}
    }

    app::run_service().await
}
