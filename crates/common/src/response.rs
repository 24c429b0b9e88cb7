// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! Evaluation of companion server responses
//!
//! Every endpoint answers with a JSON object carrying a `success` flag and,
//! on failure, an optional `error` string. A missing `success` counts as false.

use serde_json::Value;

use crate::endpoint::Operation;
use crate::error::{Error, Result, TransportError};

pub type JsonMap = serde_json::Map<String, Value>;

const STATUS_UNAUTHORIZED: u16 = 401;

/// Parse a response body into a JSON object
pub fn parse_body(body: &[u8]) -> Result<JsonMap> {
    let value: Value = serde_json::from_slice(body).map_err(Error::invalid_json)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::Protocol("Invalid response format".to_string())),
    }
}

/// Apply the `error` / `success` discriminator to a parsed response
pub fn check_success(map: JsonMap, operation: Operation) -> Result<JsonMap> {
    if let Some(error) = map.get("error") {
        let message = match error {
            Value::String(s) if !s.is_empty() => s.clone(),
            _ => operation.default_error().to_string(),
        };
        return Err(Error::Application(message));
    }

    if !is_success(&map) {
        return Err(Error::Application(operation.default_error().to_string()));
    }

    Ok(map)
}

/// Evaluate a complete HTTP response (status code plus body)
pub fn evaluate(status: u16, body: &[u8], operation: Operation) -> Result<JsonMap> {
    check_success(parse_response(status, body)?, operation)
}

/// Status and body checks shared by every endpoint, without the `success` discriminator
///
/// A non-2xx status is a transport failure unless the body carries an
/// `error` for the caller to surface.
pub fn parse_response(status: u16, body: &[u8]) -> Result<JsonMap> {
    if status == STATUS_UNAUTHORIZED {
        return Err(TransportError::AuthenticationRequired.into());
    }

    let ok_status = (200..300).contains(&status);
    match parse_body(body) {
        Ok(map) if !ok_status && !map.contains_key("error") => {
            Err(TransportError::Other(format!("HTTP {}", status)).into())
        }
        Ok(map) => Ok(map),
        Err(_) if !ok_status => Err(TransportError::Other(format!("HTTP {}", status)).into()),
        Err(e) => Err(e),
    }
}

/// Outcome of a `/shutdown` response
///
/// The server's `message` is kept on both success and failure; a failure
/// without one falls back to `error`, then to the default.
pub fn check_shutdown(map: &JsonMap) -> Result<String> {
    let message = string_field(map, "message").filter(|m| !m.is_empty());
    if is_success(map) && !map.contains_key("error") {
        return Ok(message.unwrap_or_else(|| "Shutdown initiated".to_string()));
    }

    let message = message
        .or_else(|| string_field(map, "error").filter(|e| !e.is_empty()))
        .unwrap_or_else(|| Operation::Shutdown.default_error().to_string());
    Err(Error::Application(message))
}

/// `success` is true only when present and literally `true`
pub fn is_success(map: &JsonMap) -> bool {
    map.get("success").and_then(Value::as_bool).unwrap_or(false)
}

/// Optional string field, ignoring non-string values
pub fn string_field(map: &JsonMap, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Required string field; absence is a protocol error
pub fn require_string(map: &JsonMap, key: &str) -> Result<String> {
    string_field(map, key)
        .ok_or_else(|| Error::Protocol(format!("Response is missing the '{}' field", key)))
}
