use std::io;

use color_eyre::owo_colors::OwoColorize;
use eyre::Result;
use tracing_subscriber::EnvFilter;

pub mod cache;
pub mod cli;
pub mod config;
pub mod misc;
pub mod panel;
pub mod plc;
pub mod server;

pub use cli::{CliOpts, cli};

const DEFAULT_FILTER: &str = "spsctl=info";

pub fn init() -> Result<()> {
    color_eyre::install()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

pub fn banner() {
    let arch = option_env!("SPSCTL_CARGO_CFG_TARGET_ARCH").unwrap_or("unknown");
    let os = option_env!("SPSCTL_CARGO_CFG_TARGET_OS").unwrap_or("unknown");
    let env = option_env!("SPSCTL_CARGO_CFG_TARGET_ENV").unwrap_or_default();

    eprintln!(
        "{} v{} {}",
        env!("CARGO_PKG_NAME").bold(),
        env!("CARGO_PKG_VERSION"),
        format!("({arch}-{os}{}{env})", if env.is_empty() { "" } else { "-" }).dimmed()
    );
}
