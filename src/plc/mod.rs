//! Session and command layer for the controller's JSON-RPC management API.
//!
//! [`Authenticator`] trades credentials for a [`Token`], [`Dispatcher`] turns a
//! [`Command`] into an authenticated write and returns the confirmed
//! [`DeviceState`]. Both talk to the controller through a [`Transport`].

pub mod auth;
pub mod defs;
pub mod dispatch;
pub mod protocol;
pub mod transport;

pub use auth::{AuthError, Authenticator};
pub use defs::{Command, Credentials, DeviceState, Session, Token};
pub use dispatch::{DispatchError, Dispatcher};
pub use transport::{HttpTransport, RequestOptions, Transport};
