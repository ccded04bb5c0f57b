//! JSON-RPC request bodies and reply interpretation.
//!
//! Requests are `{"method", "id", "params", "version"}` objects posted to the
//! system endpoint. Replies carry either a `result` array or an
//! `error: [code, message]` pair.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use ldpm_app::ports::ProtocolError;
use ldpm_domain::command::PowerAction;
use ldpm_domain::device::PowerState;

const REQUEST_ID: u32 = 1;
const API_VERSION: &str = "1.0";

/// Outgoing JSON-RPC call.
#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub method: &'static str,
    pub id: u32,
    pub params: Vec<Value>,
    pub version: &'static str,
}

impl RpcRequest {
    /// Build the call carrying `action`.
    #[must_use]
    pub fn for_action(action: PowerAction) -> Self {
        let (method, params) = match action.power_flag() {
            Some(status) => ("setPowerStatus", vec![json!({ "status": status })]),
            None => ("getPowerStatus", Vec::new()),
        };
        Self {
            method,
            id: REQUEST_ID,
            params,
            version: API_VERSION,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<Vec<Value>>,
}

/// Turn an HTTP status and body into a power state or a classified error.
///
/// # Errors
///
/// - 401/403 (HTTP or RPC code) → [`ProtocolError::Auth`]
/// - HTTP 404/405/501 or RPC code 12/14/501 → [`ProtocolError::Unsupported`]
/// - anything else that is not a success → [`ProtocolError::Device`]
pub fn interpret(action: PowerAction, status: u16, body: &[u8]) -> Result<PowerState, ProtocolError> {
    match status {
        401 | 403 => return Err(ProtocolError::Auth),
        404 | 405 | 501 => return Err(ProtocolError::Unsupported(format!("HTTP {status}"))),
        200..=299 => {}
        _ => return Err(ProtocolError::Device(format!("HTTP {status}"))),
    }

    let reply: RpcReply = serde_json::from_slice(body)
        .map_err(|err| ProtocolError::Device(format!("malformed reply: {err}")))?;

    if let Some(error) = reply.error {
        return Err(rpc_error(&error));
    }
    let Some(result) = reply.result else {
        return Err(ProtocolError::Device(
            "reply carries neither result nor error".to_string(),
        ));
    };

    match action.power_flag() {
        Some(true) => Ok(PowerState::On),
        Some(false) => Ok(PowerState::Standby),
        None => reported_state(&result),
    }
}

fn rpc_error(error: &[Value]) -> ProtocolError {
    let code = error.first().and_then(Value::as_i64);
    let message = error
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    match code {
        Some(401 | 403) => ProtocolError::Auth,
        Some(code @ (12 | 14 | 501)) => ProtocolError::Unsupported(format!("{code} {message}")),
        Some(code) => ProtocolError::Device(format!("{code} {message}")),
        None => ProtocolError::Device(format!("unrecognised error payload: {error:?}")),
    }
}

fn reported_state(result: &[Value]) -> Result<PowerState, ProtocolError> {
    let status = result
        .first()
        .and_then(|entry| entry.get("status"))
        .and_then(Value::as_str);
    match status {
        Some("active") => Ok(PowerState::On),
        Some("standby") => Ok(PowerState::Standby),
        Some(other) => Err(ProtocolError::Device(format!(
            "unknown power status {other:?}"
        ))),
        None => Err(ProtocolError::Device(
            "power status missing from reply".to_string(),
        )),
    }
}
