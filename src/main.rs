mod chat;
mod cli;
mod config;
mod error;
mod llm;
mod message;
mod render;
mod transcript;

use std::error::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use config::{load_config, Config};
use render::OutputRoute;

fn init_tracing(config: &Config, route: OutputRoute) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.debug { "warn,parley=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(route)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = load_config();
    // log lines share the transcript's printer once the line editor is up
    let route = OutputRoute::default();
    init_tracing(&config, route.clone());
    debug!(?config, "configuration loaded");

    cli::run_cli(config, route)
}
