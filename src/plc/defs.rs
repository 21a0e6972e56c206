use std::fmt;

use serde::{Deserialize, Serialize};

/* == Command == */

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Command {
    SetPower(bool),
    SetSpeed(u32),
}

/* == DeviceState == */

/// Last power and speed values confirmed by the controller.
///
/// Only ever advanced by a successful write, a failed or rejected command
/// leaves the previous value in place.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceState {
    pub power: bool,
    pub speed: u32,
}

/* == Session == */

/// Opaque bearer token issued by `Api.Login`.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Token(String);

/// An authenticated connection to a single controller.
#[derive(Clone, Debug, Serialize)]
pub struct Session {
    token: Token,
    address: String,
    username: String,
}

/// Login credentials, only held for the duration of a login attempt.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

/* === Implementations === */

impl Command {
    pub fn apply(&self, state: DeviceState) -> DeviceState {
        match *self {
            Command::SetPower(power) => DeviceState { power, ..state },
            Command::SetSpeed(speed) => DeviceState { speed, ..state },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetPower(true) => write!(f, "power on"),
            Command::SetPower(false) => write!(f, "power off"),
            Command::SetSpeed(speed) => write!(f, "speed {speed}"),
        }
    }
}

impl DeviceState {
    pub const MAX_SPEED: u32 = 3000;

    /// Speed writes are only meaningful while the motor is powered.
    pub fn can_set_speed(&self) -> bool {
        self.power
    }
}

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

impl Session {
    pub fn new(token: Token, address: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token,
            address: address.into(),
            username: username.into(),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
