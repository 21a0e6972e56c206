use std::{fmt, sync::Arc};

use serde::Serialize;
use thiserror::Error;

use crate::{
    cache::{CredentialCache, LastLogin},
    plc::{
        AuthError, Authenticator, Command, Credentials, DeviceState, DispatchError, Dispatcher,
        Session, Transport,
    },
};

/* === Definitions === */

/// Single owner of the session and the confirmed device state.
///
/// Every command goes through `&mut self`, so wrapping the panel in a mutex
/// is enough to serialise writes coming from several callers.
pub struct ControlPanel {
    authenticator: Authenticator,
    dispatcher: Dispatcher,
    cache: Box<dyn CredentialCache>,
    session: Option<Session>,
    state: DeviceState,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PanelError {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub address: Option<String>,
    pub username: Option<String>,
    pub power: bool,
    pub speed: u32,
    pub can_set_speed: bool,
}

/* === Implementations === */

impl ControlPanel {
    pub fn new(transport: Arc<dyn Transport>, cache: Box<dyn CredentialCache>) -> Self {
        Self {
            authenticator: Authenticator::new(transport.clone()),
            dispatcher: Dispatcher::new(transport),
            cache,
            session: None,
            state: DeviceState::default(),
        }
    }

    /// Address and user to prefill, an unreadable cache counts as empty.
    pub async fn last_login(&self) -> LastLogin {
        self.cache.load().await.unwrap_or_else(|err| {
            tracing::warn!("Ignoring credential cache: {err:#}");
            LastLogin::default()
        })
    }

    pub async fn login(
        &mut self,
        address: &str,
        credentials: &Credentials,
    ) -> Result<&Session, PanelError> {
        let session = self.authenticator.open_session(address, credentials).await?;

        let last = LastLogin {
            last_address: Some(session.address().to_owned()),
            last_username: Some(session.username().to_owned()),
        };

        if let Err(err) = self.cache.store(&last).await {
            tracing::warn!("Failed to remember login: {err:#}");
        }

        // Nothing is known about a freshly connected device
        self.state = DeviceState::default();

        Ok(&*self.session.insert(session))
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!("Logged out of {}", session.address());
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<DeviceState, PanelError> {
        let session = self.session.as_ref().ok_or(PanelError::NotAuthenticated)?;

        let result = self
            .dispatcher
            .dispatch(session.token(), session.address(), command, self.state)
            .await;

        match result {
            Ok(state) => {
                self.state = state;
                Ok(state)
            }

            Err(DispatchError::AuthRejected) => {
                tracing::info!("Session expired, a new login is required");
                self.session = None;
                Err(DispatchError::AuthRejected.into())
            }

            Err(err) => Err(err.into()),
        }
    }

    pub async fn set_power(&mut self, on: bool) -> Result<DeviceState, PanelError> {
        self.execute(Command::SetPower(on)).await
    }

    pub async fn set_speed(&mut self, speed: u32) -> Result<DeviceState, PanelError> {
        self.execute(Command::SetSpeed(speed)).await
    }

    /// Powers the motor down, whatever the last known state was.
    pub async fn emergency_stop(&mut self) -> Result<DeviceState, PanelError> {
        tracing::warn!("Emergency stop");
        self.set_power(false).await
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn status(&self) -> Status {
        Status {
            address: self.session.as_ref().map(|s| s.address().to_owned()),
            username: self.session.as_ref().map(|s| s.username().to_owned()),
            power: self.state.power,
            speed: self.state.speed,
            can_set_speed: self.session.is_some() && self.state.can_set_speed(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(address) = &self.address else {
            return write!(f, "Not connected");
        };

        writeln!(f, "Connected to {address}")?;

        if self.power {
            writeln!(f, "Device is running")?;
        } else {
            writeln!(f, "Device is off")?;
        }

        write!(f, "Speed: {}", self.speed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use eyre::{Result, eyre};
    use serde_json::{Value, json};
    use tempfile::tempdir;

    use crate::{cache::FileCache, plc::transport::stub::StubTransport};

    use super::*;

    const ADDRESS: &str = "192.168.10.61";

    #[derive(Clone, Default)]
    struct MemoryCache(Arc<Mutex<Option<LastLogin>>>);

    #[async_trait]
    impl CredentialCache for MemoryCache {
        async fn load(&self) -> Result<LastLogin> {
            self.0.lock().unwrap().clone().ok_or_else(|| eyre!("empty"))
        }

        async fn store(&self, login: &LastLogin) -> Result<()> {
            *self.0.lock().unwrap() = Some(login.clone());
            Ok(())
        }
    }

    fn token_reply() -> Option<Value> {
        Some(json!([{ "jsonrpc": "2.0", "id": 0, "result": { "token": "T" } }]))
    }

    fn confirmed() -> Option<Value> {
        Some(json!([{ "jsonrpc": "2.0", "id": 1, "result": true }]))
    }

    fn panel(stub: &StubTransport, cache: &MemoryCache) -> ControlPanel {
        ControlPanel::new(Arc::new(stub.clone()), Box::new(cache.clone()))
    }

    fn credentials() -> Credentials {
        Credentials::new("operator", "hunter2")
    }

    #[tokio::test]
    async fn test_login_remembers_address() {
        let stub = StubTransport::new().reply(token_reply());
        let cache = MemoryCache::default();
        let mut panel = panel(&stub, &cache);

        assert_eq!(panel.last_login().await, LastLogin::default());

        panel.login(ADDRESS, &credentials()).await.unwrap();

        assert_eq!(
            panel.last_login().await,
            LastLogin {
                last_address: Some(ADDRESS.into()),
                last_username: Some("operator".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_failed_login() {
        let stub = StubTransport::new().reply(Some(json!([{ "result": {} }]))).reply(None);
        let cache = MemoryCache::default();
        let mut panel = panel(&stub, &cache);

        let result = panel.login(ADDRESS, &credentials()).await.map(|_| ());
        assert_eq!(result, Err(PanelError::Auth(AuthError::InvalidCredentials)));

        let result = panel.login(ADDRESS, &credentials()).await.map(|_| ());
        assert_eq!(result, Err(PanelError::Auth(AuthError::Transport)));

        assert!(panel.session().is_none());
        assert!(cache.0.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_requires_session() {
        let stub = StubTransport::new();
        let mut panel = panel(&stub, &MemoryCache::default());

        assert_eq!(panel.set_power(true).await, Err(PanelError::NotAuthenticated));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_commits_confirmed_state() {
        let stub = StubTransport::new()
            .reply(token_reply())
            .reply(confirmed())
            .reply(None)
            .reply(confirmed());

        let mut panel = panel(&stub, &MemoryCache::default());
        panel.login(ADDRESS, &credentials()).await.unwrap();

        assert_eq!(
            panel.set_speed(500).await,
            Err(PanelError::Dispatch(DispatchError::InvalidPrecondition))
        );

        panel.set_power(true).await.unwrap();

        assert_eq!(
            panel.set_speed(1500).await,
            Err(PanelError::Dispatch(DispatchError::WriteFailed))
        );
        assert_eq!(panel.state(), DeviceState { power: true, speed: 0 });

        panel.set_speed(1500).await.unwrap();

        assert_eq!(
            panel.status(),
            Status {
                address: Some(ADDRESS.into()),
                username: Some("operator".into()),
                power: true,
                speed: 1500,
                can_set_speed: true,
            }
        );
    }

    #[tokio::test]
    async fn test_rejected_token_ends_session() {
        let stub = StubTransport::new().reply(token_reply()).reply(Some(json!([
            { "jsonrpc": "2.0", "id": 1, "error": { "code": 2, "message": "Permission denied" } }
        ])));

        let mut panel = panel(&stub, &MemoryCache::default());
        panel.login(ADDRESS, &credentials()).await.unwrap();

        assert_eq!(
            panel.emergency_stop().await,
            Err(PanelError::Dispatch(DispatchError::AuthRejected))
        );
        assert!(panel.session().is_none());

        assert_eq!(panel.set_power(false).await, Err(PanelError::NotAuthenticated));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_relogin_resets_state() {
        let stub = StubTransport::new()
            .reply(token_reply())
            .reply(confirmed())
            .reply(token_reply());

        let mut panel = panel(&stub, &MemoryCache::default());

        panel.login(ADDRESS, &credentials()).await.unwrap();
        panel.set_power(true).await.unwrap();
        panel.logout();

        assert!(panel.session().is_none());
        assert_eq!(panel.status().to_string(), "Not connected");

        panel.login(ADDRESS, &credentials()).await.unwrap();
        assert_eq!(panel.state(), DeviceState::default());
        assert_eq!(
            panel.status().to_string(),
            "Connected to 192.168.10.61\nDevice is off\nSpeed: 0"
        );
    }

    #[tokio::test]
    async fn test_password_never_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let stub = StubTransport::new().reply(token_reply());
        let mut panel = ControlPanel::new(Arc::new(stub), Box::new(FileCache::new(&path)));

        panel.login(ADDRESS, &credentials()).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("operator"));
        assert!(!raw.contains("hunter2"));
        assert!(!raw.contains("\"T\""));
    }
}
