//! mediatool - command line front end for the media tool helpers

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use tracing::{debug, info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mediatool::cli::{Args, Commands};
use mediatool::config::Config;
use mediatool::media::{MediaToolFactory, MediaToolTrait};

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(secs) = args.timeout {
        config.media.timeout_secs = Some(secs);
    }
    config.validate()?;
    debug!("Loaded configuration: {:?}", config);

    // Each external tool is killed once the configured timeout elapses
    let tool = MediaToolFactory::create_invoker(config);

    match args.command {
        Commands::Hwaccel => {
            let available = tool.has_hardware_acceleration();
            println!("{}", if available { "vaapi" } else { "none" });
        }
        Commands::Thumbnail { input, output, timestamp } => {
            info!("Extracting thumbnail from {}", input.display());
            let ok = tool.extract_thumbnail(&input, &output, timestamp.as_deref());
            ensure_success(ok, "Thumbnail extraction")?;
        }
        Commands::Audio { input, output, index } => {
            let ok = tool.extract_audio_track(&input, &output, index);
            ensure_success(ok, "Audio extraction")?;
        }
        Commands::Subtitle { input, output, index } => {
            let ok = tool.extract_subtitle_track(&input, &output, index);
            ensure_success(ok, "Subtitle extraction")?;
        }
        Commands::Probe { input, pretty } => {
            let metadata = tool
                .get_media_metadata(&input)
                .ok_or_else(|| anyhow!("No metadata available"))?;

            let json = if pretty {
                serde_json::to_string_pretty(&metadata)?
            } else {
                serde_json::to_string(&metadata)?
            };
            println!("{}", json);
        }
        Commands::Check => {
            tool.check_availability()?;
            println!("{}", tool.get_version_info()?);
        }
    }

    Ok(())
}

fn ensure_success(ok: bool, what: &str) -> Result<()> {
    if !ok {
        bail!("{} failed", what);
    }
    info!("{} completed", what);
    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".mediatool").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "mediatool.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
