//! Response normalization.
//!
//! The backend answers mutations with several shapes: an empty body, a bare
//! `true`/`false`, the bare record, or an envelope such as
//! `{"success": true, "data": {...}, "message": "..."}`. Everything is folded
//! into [`ApiOutcome`] here so callers never branch on shape.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{ApiError, ApiResult};
use crate::util::compact_text;

/// Normalized result of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiOutcome<T> {
    pub success: bool,
    pub payload: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiOutcome<T> {
    const fn succeeded(payload: Option<T>) -> Self {
        Self {
            success: true,
            payload,
            message: None,
        }
    }

    /// Collapse into a `Result`; an explicit failure becomes [`ApiError::Rejected`].
    pub fn into_result(self) -> ApiResult<Option<T>> {
        if self.success {
            Ok(self.payload)
        } else {
            Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ))
        }
    }
}

/// Normalize a raw HTTP status and body.
///
/// `payload_key` names the field that carries the record inside an envelope
/// when the backend does not use `data` (for example `task`).
pub fn normalize<T: DeserializeOwned>(
    status: u16,
    body: &str,
    payload_key: &str,
) -> ApiResult<ApiOutcome<T>> {
    let body = body.trim();
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            message: error_message(body).unwrap_or_else(|| format!("HTTP {status}")),
        });
    }
    if body.is_empty() {
        return Ok(ApiOutcome::succeeded(None));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|error| ApiError::InvalidPayload(format!("{error}: {}", compact_text(body))))?;

    match value {
        Value::Null => Ok(ApiOutcome::succeeded(None)),
        Value::Bool(success) => Ok(ApiOutcome {
            success,
            payload: None,
            message: None,
        }),
        Value::Object(map) if map.contains_key("success") => unwrap_envelope(map, payload_key),
        other => Ok(ApiOutcome::succeeded(Some(decode(other)?))),
    }
}

fn unwrap_envelope<T: DeserializeOwned>(
    mut map: Map<String, Value>,
    payload_key: &str,
) -> ApiResult<ApiOutcome<T>> {
    let success = map
        .remove("success")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    let message = take_message(&mut map);

    if !success {
        return Ok(ApiOutcome {
            success,
            payload: None,
            message,
        });
    }

    let payload = match map.remove("data").or_else(|| map.remove(payload_key)) {
        Some(Value::Null) => None,
        Some(value) => Some(decode(value)?),
        // Flat envelope: the remaining fields are the payload.
        None if !map.is_empty() => Some(decode(Value::Object(map))?),
        None => None,
    };

    Ok(ApiOutcome {
        success,
        payload,
        message,
    })
}

fn take_message(map: &mut Map<String, Value>) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| map.remove(*key))
        .find_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        })
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|error| ApiError::InvalidPayload(error.to_string()))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return Some(message.trim().to_string());
        }
    }
    if body.is_empty() {
        None
    } else {
        Some(compact_text(body))
    }
}
