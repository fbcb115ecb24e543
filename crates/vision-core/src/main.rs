use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vision_core::config::{Config, ConfigError, SourceMode};
use vision_core::display::WindowDisplay;
use vision_core::session::{Session, SessionEnd, SessionOptions};
use vision_core::source::{open_source, FrameSource};

#[derive(Debug, Parser)]
#[command(about = "Names the color at the centre of a network camera feed")]
struct Args {
    /// TOML configuration file [default: config/default.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera address, overrides camera.host
    #[arg(long)]
    host: Option<String>,

    /// Frame acquisition strategy, overrides camera.mode
    #[arg(long, value_enum)]
    mode: Option<SourceMode>,
}

fn load_config(args: &Args) -> (Config, Option<ConfigError>) {
    let loaded = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::load_default(),
    };
    let (mut config, error) = match loaded {
        Ok(cfg) => (cfg, None),
        Err(e) => (Config::default(), Some(e)),
    };

    if let Some(host) = &args.host {
        config.camera.host = host.clone();
    }
    if let Some(mode) = args.mode {
        config.camera.mode = mode;
    }
    (config, error)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let (config, load_error) = load_config(&args);

    init_logging(&config.system.log_level);
    tracing::info!("Color recognition waking up...");
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "Using default configuration");
    }
    config.validate()?;

    let source = match open_source(&config.camera) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to connect to camera. Please check the IP address and ensure the camera is running."
            );
            return Ok(());
        }
    };
    tracing::info!(source = source.describe(), "Connected to camera stream. Press 'q' to quit.");

    let display = WindowDisplay::new(config.display.window_title.clone());
    let report = Session::new(source, display, SessionOptions::from_config(&config)).run();

    match &report.end {
        SessionEnd::Quit => {}
        SessionEnd::SourceFailed(e) => tracing::error!(error = %e, "Session ended"),
        SessionEnd::DisplayFailed(e) => tracing::error!(error = %e, "Session ended"),
    }
    tracing::info!(
        frames = report.frames,
        retries = report.retries,
        last_color = ?report.last_color,
        "Camera and window released"
    );
    Ok(())
}
