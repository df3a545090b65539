mod chart;
mod client;
mod config;
mod controller;
mod export;
mod headless;
mod page;
mod reading;
mod scheduler;
mod tui;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::client::{SensorClient, SensorSource};
use crate::config::DashboardConfig;
use crate::controller::DashboardController;
use crate::export::ExportFormat;
use crate::headless::HeadlessFrontend;
use crate::scheduler::{Scheduler, UserAction};
use crate::tui::TerminalFrontend;

#[derive(Parser)]
#[command(name = "sensor-dashboard")]
#[command(about = "Live and historical temperature/humidity dashboard", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Sensor backend URL, overrides the config file
    #[arg(short, long, global = true)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live dashboard
    Watch {
        /// Run without a terminal UI and only log
        #[arg(long, default_value = "false")]
        headless: bool,

        /// Open the history view for this many hours at start
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        history: Option<u32>,

        /// Directory for log files, overrides the config file
        #[arg(short, long)]
        log_dir: Option<PathBuf>,
    },
    /// Print the latest reading once
    Latest,
    /// Fetch a history window and write it to a file
    Export {
        /// Lookback window in hours
        #[arg(long, default_value = "24", value_parser = clap::value_parser!(u32).range(1..))]
        hours: u32,

        /// Output file path
        #[arg(short, long, default_value = "history.csv")]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,
    },
}

fn load_config(common: &CommonArgs) -> anyhow::Result<DashboardConfig> {
    let mut config = DashboardConfig::resolve(common.config.as_deref())?;
    if let Some(url) = &common.url {
        config.server.base_url = url.clone();
    }
    Ok(config)
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()))
}

// Single-threaded on purpose: the controller is only ever touched from one task
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.common)?;

    match cli.command {
        Commands::Watch {
            headless,
            history,
            log_dir,
        } => {
            // The terminal UI owns stdout, so logs go to a file
            let log_dir = log_dir.unwrap_or_else(|| config.logging.dir.clone());
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("create log directory {:?}", log_dir))?;
            let file_appender = RollingFileAppender::new(Rotation::HOURLY, &log_dir, "sensor-dashboard.log");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
            let stdout_layer = headless.then(|| fmt::layer().with_writer(std::io::stdout));

            tracing_subscriber::registry()
                .with(env_filter(&config.logging.level))
                .with(stdout_layer)
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();

            info!("Starting sensor dashboard");
            info!("Backend: {}", config.server.base_url);

            let client = SensorClient::new(&config.server.base_url, config.server.request_timeout())?;
            let controller = DashboardController::new(
                config.display.default_history_hours,
                config.display.device_pixel_ratio,
            );
            let scheduler = Scheduler::new(controller, Arc::new(client), config.polling.clone());

            let (tx, rx) = mpsc::unbounded_channel();
            if let Some(hours) = history {
                tx.send(UserAction::ShowHistory(hours))?;
            }

            if headless {
                info!("Running in headless mode. Press Ctrl+C to stop");
                let quit_tx = tx.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        let _ = quit_tx.send(UserAction::Quit);
                    }
                });

                let mut frontend = HeadlessFrontend::default();
                scheduler.run(&mut frontend, rx, config.display.frame_interval()).await?;
                info!("Shutting down...");
            } else {
                let presets = config.display.history_presets.clone();
                let mut frontend = TerminalFrontend::enter(presets.clone())?;
                tui::spawn_input(tx.clone(), presets);

                let result = scheduler.run(&mut frontend, rx, config.display.frame_interval()).await;
                frontend.restore()?;
                result?;
            }

            Ok(())
        }
        Commands::Latest => {
            tracing_subscriber::registry()
                .with(env_filter(&config.logging.level))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();

            let client = SensorClient::new(&config.server.base_url, config.server.request_timeout())?;
            let latest = client
                .latest()
                .await
                .with_context(|| format!("fetch latest reading from {}", client.base_url()))?;

            println!("Temperatura: {}", latest.temperature_text());
            println!("Wilgotność:  {}", latest.humidity_text());
            Ok(())
        }
        Commands::Export {
            hours,
            output,
            format,
        } => {
            tracing_subscriber::registry()
                .with(env_filter(&config.logging.level))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();

            let client = SensorClient::new(&config.server.base_url, config.server.request_timeout())?;
            let series = client
                .history(hours)
                .await
                .with_context(|| format!("fetch {}h of history from {}", hours, client.base_url()))?;

            if series.is_empty() {
                warn!("No readings in the last {}h", hours);
            }

            let file = std::fs::File::create(&output)
                .with_context(|| format!("create {:?}", output))?;
            export::write_series(&series, format, std::io::BufWriter::new(file))?;
            println!("Exported {} readings to {:?}", series.len(), output);
            Ok(())
        }
    }
}
