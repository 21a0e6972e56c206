use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use strum::IntoStaticStr;

use super::defs::Command;

/* === Definitions === */

pub const API_PATH: &str = "/api/jsonrpc";

const JSONRPC_VERSION: &str = "2.0";

#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum Method {
    #[strum(serialize = "Api.Login")]
    Login,
    #[strum(serialize = "PlcProgram.Write")]
    Write,
}

/// PLC tags addressed by the write commands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoStaticStr)]
pub enum Variable {
    #[strum(serialize = "\"Motor\".ein")]
    MotorPower,
    #[strum(serialize = "\"Motor\".Sollgeschwindigkeit")]
    MotorSpeed,
}

#[derive(Debug, Serialize)]
pub struct Request<P> {
    jsonrpc: &'static str,
    method: &'static str,
    id: u32,
    params: P,
}

/// Deliberately not `Debug`, this carries the password.
#[derive(Serialize)]
pub struct LoginParams<'a> {
    user: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct WriteParams {
    var: &'static str,
    value: Value,
}

#[derive(Debug, Deserialize)]
pub struct Response<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResult {
    pub token: Option<String>,
}

/* === Implementations === */

impl Method {
    pub fn id(&self) -> u32 {
        match self {
            Method::Login => 0,
            Method::Write => 1,
        }
    }
}

impl<P: Serialize> Request<P> {
    pub fn new(method: Method, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            id: method.id(),
            params,
        }
    }

    /// The controller expects every call wrapped in a batch, even single ones.
    pub fn into_batch(self) -> Value {
        json!([self])
    }
}

impl<'a> LoginParams<'a> {
    pub fn new(user: &'a str, password: &'a str) -> Self {
        Self { user, password }
    }
}

impl From<Command> for WriteParams {
    fn from(command: Command) -> Self {
        let (var, value) = match command {
            Command::SetPower(on) => (Variable::MotorPower, json!(on)),
            Command::SetSpeed(speed) => (Variable::MotorSpeed, json!(speed)),
        };

        Self {
            var: var.into(),
            value,
        }
    }
}

impl<T: DeserializeOwned> Response<T> {
    /// Extracts the first reply of a batch. A bare object is accepted as a
    /// non-batched reply, anything else yields `None`.
    pub fn first(value: Value) -> Option<Self> {
        let reply = match value {
            Value::Array(replies) => replies.into_iter().next()?,
            reply @ Value::Object(_) => reply,
            _ => return None,
        };

        serde_json::from_value(reply).ok()
    }
}

impl RpcError {
    /// Error code the controller answers with when the `X-Auth-Token` is
    /// missing, expired or lacks the rights for the call.
    pub const PERMISSION_DENIED: i64 = 2;

    pub fn is_permission_denied(&self) -> bool {
        self.code == Self::PERMISSION_DENIED
    }
}

pub fn endpoint(address: &str) -> String {
    format!("https://{address}{API_PATH}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request() {
        let batch = Request::new(Method::Login, LoginParams::new("admin", "secret")).into_batch();

        assert_eq!(
            batch,
            json!([{
                "jsonrpc": "2.0",
                "method": "Api.Login",
                "id": 0,
                "params": { "user": "admin", "password": "secret" }
            }])
        );
    }

    #[test]
    fn test_write_requests() {
        let power = Request::new(Method::Write, WriteParams::from(Command::SetPower(true)));
        let speed = Request::new(Method::Write, WriteParams::from(Command::SetSpeed(1200)));

        assert_eq!(
            power.into_batch(),
            json!([{
                "jsonrpc": "2.0",
                "method": "PlcProgram.Write",
                "id": 1,
                "params": { "var": "\"Motor\".ein", "value": true }
            }])
        );

        assert_eq!(
            speed.into_batch()[0]["params"],
            json!({ "var": "\"Motor\".Sollgeschwindigkeit", "value": 1200 })
        );
    }

    #[test]
    fn test_first_reply() {
        let reply = Response::<LoginResult>::first(json!([
            { "jsonrpc": "2.0", "id": 0, "result": { "token": "abc" } }
        ]))
        .unwrap();

        assert_eq!(reply.result.unwrap().token.as_deref(), Some("abc"));

        let reply = Response::<Value>::first(json!({
            "jsonrpc": "2.0", "id": 1, "error": { "code": 2, "message": "Permission denied" }
        }))
        .unwrap();

        assert!(reply.error.unwrap().is_permission_denied());

        assert!(Response::<Value>::first(json!([])).is_none());
        assert!(Response::<Value>::first(json!(null)).is_none());
        assert!(Response::<Value>::first(json!([42])).is_none());
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            endpoint("192.168.10.61"),
            "https://192.168.10.61/api/jsonrpc"
        );
    }
}
