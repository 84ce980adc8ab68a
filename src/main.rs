use clap::Parser;
use log::{error, info};
use scenery::app;
use scenery::io::config::Config;
use std::process::ExitCode;

/// Headless scene renderer driven by a TOML file.
#[derive(Parser, Debug)]
#[command(name = "scenery", version, about)]
struct Cli {
    /// Scene description (TOML). Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Number of frames to simulate, overriding `render.frames`.
    #[arg(short, long)]
    frames: Option<usize>,

    /// Image written after the last frame, overriding `render.output`.
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading config '{}'", path);
            match Config::load(path) {
                Ok(config) => config,
                Err(e) => {
                    error!("{e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => {
            info!("No config given, using defaults");
            Config::default()
        }
    };
    if let Some(frames) = cli.frames {
        config.render.frames = frames;
    }
    if let Some(output) = cli.output {
        config.render.output = output;
    }

    match app::run(&config) {
        Ok(summary) => {
            info!(
                "Done: {} frames, {} draw calls in the last one",
                summary.frames, summary.last_frame.draw_calls
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
