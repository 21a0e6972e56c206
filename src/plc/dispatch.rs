use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::{
    defs::{Command, DeviceState, Token},
    protocol::{Method, Request, Response, WriteParams, endpoint},
    transport::{RequestOptions, Transport},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Speed can only be changed while the device is powered")]
    InvalidPrecondition,

    #[error("Speed {0} is outside of 0..={max}", max = DeviceState::MAX_SPEED)]
    OutOfRange(u32),

    #[error("The controller did not accept the write")]
    WriteFailed,

    #[error("The controller rejected the session token")]
    AuthRejected,
}

/// Turns commands into authenticated `PlcProgram.Write` calls.
///
/// Each call issues at most one request. Concurrent calls are neither
/// serialised nor reordered, that is left to the owner of the state.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    #[tracing::instrument(skip(self, token, state))]
    pub async fn dispatch(
        &self,
        token: &Token,
        address: &str,
        command: Command,
        state: DeviceState,
    ) -> Result<DeviceState, DispatchError> {
        Self::validate(command, &state)?;

        let body = Request::new(Method::Write, WriteParams::from(command)).into_batch();
        let options =
            RequestOptions::post(body).with_header(RequestOptions::AUTH_HEADER, token.as_str());

        let reply = self.transport.request(&endpoint(address), options).await;

        Self::interpret(reply)?;

        tracing::debug!("Write confirmed");

        Ok(command.apply(state))
    }

    fn validate(command: Command, state: &DeviceState) -> Result<(), DispatchError> {
        match command {
            Command::SetSpeed(_) if !state.can_set_speed() => Err(DispatchError::InvalidPrecondition),
            Command::SetSpeed(speed) if speed > DeviceState::MAX_SPEED => {
                Err(DispatchError::OutOfRange(speed))
            }
            _ => Ok(()),
        }
    }

    fn interpret(reply: Option<Value>) -> Result<(), DispatchError> {
        let response = reply
            .and_then(Response::<Value>::first)
            .ok_or(DispatchError::WriteFailed)?;

        match response.error {
            None => Ok(()),
            Some(error) if error.is_permission_denied() => {
                tracing::warn!("Session token rejected by the controller");
                Err(DispatchError::AuthRejected)
            }
            Some(error) => {
                tracing::warn!("Write rejected ({}): {}", error.code, error.message);
                Err(DispatchError::WriteFailed)
            }
        }
    }
}
