use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vinyl_scratch::app;
use vinyl_scratch::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "A virtual record you can play, pitch and scratch")]
struct Cli {
    /// Track to load on startup. Overrides the config file.
    track: Option<String>,
    /// JSON settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> iced::Result {
    init_tracing();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("{e}");
                std::process::exit(2);
            }
        },
        None => Config::default(),
    };
    if cli.track.is_some() {
        config.track = cli.track;
    }

    tracing::info!(track = ?config.track, "starting");
    app::run(config)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
