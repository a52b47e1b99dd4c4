use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

mod config;
mod effects;
mod engine;
mod files;
mod metadata;
mod player;
mod playlist;
mod prefs;
mod resource;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr and stay out of the way of the TUI; raise with
    // RUST_LOG when debugging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hypertune=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    runtime::run(paths)
}
