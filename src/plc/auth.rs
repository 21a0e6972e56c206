use std::sync::Arc;

use thiserror::Error;

use super::{
    defs::{Credentials, Session, Token},
    protocol::{LoginParams, LoginResult, Method, Request, Response, endpoint},
    transport::{RequestOptions, Transport},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Could not connect to the controller")]
    Transport,

    #[error("Invalid credentials or server error")]
    InvalidCredentials,
}

/// Exchanges credentials for a session token. Never retries on its own.
#[derive(Clone)]
pub struct Authenticator {
    transport: Arc<dyn Transport>,
}

impl Authenticator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    #[tracing::instrument(skip(self, credentials), fields(user = %credentials.username))]
    pub async fn login(&self, address: &str, credentials: &Credentials) -> Result<Token, AuthError> {
        let body = Request::new(
            Method::Login,
            LoginParams::new(&credentials.username, credentials.password()),
        )
        .into_batch();

        let reply = self
            .transport
            .request(&endpoint(address), RequestOptions::post(body))
            .await
            .ok_or(AuthError::Transport)?;

        let token = Response::<LoginResult>::first(reply)
            .and_then(|response| response.result)
            .and_then(|result| result.token)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidCredentials)?;

        tracing::info!("Login successful");

        Ok(Token::new(token))
    }

    /// Logs in and binds the token to the address and user it was issued for.
    pub async fn open_session(
        &self,
        address: &str,
        credentials: &Credentials,
    ) -> Result<Session, AuthError> {
        let token = self.login(address, credentials).await?;
        Ok(Session::new(token, address, credentials.username.clone()))
    }
}
