use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::Result;

use crate::{
    cache::FileCache,
    config::Config,
    panel::ControlPanel,
    plc::HttpTransport,
    server,
};

use self::{common::ConnectOpts, exec::Step};

mod common;
mod exec;
mod interactive;

#[derive(Parser)]
#[command(version, about)]
pub struct CliOpts {
    #[arg(short, long, default_value = "spsctl.yaml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the credentials and remember address and user
    Login {
        #[command(flatten)]
        connect: ConnectOpts,
    },

    /// Log in and run steps in order: on, off, stop, speed=<n>
    Exec {
        #[command(flatten)]
        connect: ConnectOpts,
        #[arg(required = true)]
        steps: Vec<Step>,
    },

    /// Interactive control panel on stdin
    Panel {
        #[command(flatten)]
        connect: ConnectOpts,
    },

    /// Serve the control panel as an HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the effective configuration
    Config,
}

pub fn cli(opts: CliOpts) -> Result<()> {
    execute_command(opts.config, opts.command)
}

#[tokio::main]
pub async fn execute_command(config_path: String, command: Command) -> Result<()> {
    let config = Config::load(&config_path).await?;

    match command {
        Command::Login { connect } => {
            let mut panel = build_panel(&config)?;
            common::login(&mut panel, connect, &config).await?;
            println!("{}", panel.status());
            Ok(())
        }

        Command::Exec { connect, steps } => {
            let mut panel = build_panel(&config)?;
            common::login(&mut panel, connect, &config).await?;
            exec::run(&mut panel, &steps).await
        }

        Command::Panel { connect } => {
            let panel = build_panel(&config)?;
            interactive::run(panel, connect, &config).await
        }

        Command::Serve { port } => {
            let panel = build_panel(&config)?;
            server::launch(panel, port.unwrap_or(config.server.port)).await
        }

        Command::Config => {
            println!("{config}");
            Ok(())
        }
    }
}

fn build_panel(config: &Config) -> Result<ControlPanel> {
    let transport = HttpTransport::from_config(&config.transport)?;
    let cache = FileCache::new(&config.cache.path);

    Ok(ControlPanel::new(Arc::new(transport), Box::new(cache)))
}
