use std::{fmt, io, path::PathBuf};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::misc::StatusDot;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub address: Option<String>,
    pub username: Option<String>,
    pub cache: CacheConfig,
    pub transport: TransportConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    pub timeout_s: f32,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Config {
    /// Reads a YAML config, a missing file leaves every field at its default.
    pub async fn load(path: &str) -> Result<Self> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No config at {path}, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err).wrap_err_with(|| format!("Failed to read {path}")),
        };

        Self::parse(&data).wrap_err_with(|| format!("Failed to parse {path}"))
    }

    fn parse(data: &[u8]) -> Result<Self> {
        // An empty document deserialises to unit, not to an empty map
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_slice(data)?)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} address   {}", StatusDot::from(&self.address), display(&self.address))?;
        writeln!(f, "{} username  {}", StatusDot::from(&self.username), display(&self.username))?;
        writeln!(f, "  cache     {}", self.cache.path.display())?;
        writeln!(f, "  timeout   {} s", self.transport.timeout_s)?;
        writeln!(
            f,
            "{:#} certificate validation",
            StatusDot(!self.transport.accept_invalid_certs)
        )?;
        write!(f, "  port      {}", self.server.port)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".spsctl.json"),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_s: 5.,
            accept_invalid_certs: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}
