use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Address and user of the last successful login, used to prefill the next one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastLogin {
    pub last_address: Option<String>,
    pub last_username: Option<String>,
}

#[async_trait]
pub trait CredentialCache: Send + Sync {
    async fn load(&self) -> Result<LastLogin>;
    async fn store(&self, login: &LastLogin) -> Result<()>;
}

/// Keeps [`LastLogin`] as a small JSON document on disk.
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialCache for FileCache {
    async fn load(&self) -> Result<LastLogin> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LastLogin::default()),
            Err(err) => return Err(err).wrap_err("Failed to read credential cache"),
        };

        serde_json::from_slice(&data).wrap_err("Malformed credential cache")
    }

    async fn store(&self, login: &LastLogin) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&self.path, serde_json::to_vec_pretty(login)?)
            .await
            .wrap_err("Failed to write credential cache")
    }
}
