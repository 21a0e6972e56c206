use clap::Args;
use eyre::{Result, eyre};

use crate::{cache::LastLogin, config::Config, panel::ControlPanel, plc::Credentials};

#[derive(Clone, Args)]
pub struct ConnectOpts {
    /// Controller host or IP, defaults to the config file or the last login
    #[arg(short, long)]
    pub address: Option<String>,

    #[arg(short, long)]
    pub username: Option<String>,

    #[arg(short, long, env = "SPS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl ConnectOpts {
    /// Flags win over the config file, which wins over the last login.
    pub fn resolve(&self, config: &Config, last: LastLogin) -> Result<(String, Credentials)> {
        let address = self
            .address
            .clone()
            .or_else(|| config.address.clone())
            .or(last.last_address)
            .ok_or_else(|| eyre!("No controller address given"))?;

        let username = self
            .username
            .clone()
            .or_else(|| config.username.clone())
            .or(last.last_username)
            .ok_or_else(|| eyre!("No username given"))?;

        let password = self
            .password
            .clone()
            .ok_or_else(|| eyre!("No password given, pass --password or set SPS_PASSWORD"))?;

        Ok((address, Credentials::new(username, password)))
    }
}

pub async fn login(panel: &mut ControlPanel, opts: ConnectOpts, config: &Config) -> Result<()> {
    let (address, credentials) = opts.resolve(config, panel.last_login().await)?;

    tracing::info!("Connecting to {address} as {}", credentials.username);
    panel.login(&address, &credentials).await?;

    Ok(())
}
