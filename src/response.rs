//! The uniform response envelope shared by both handlers.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::types::api::GatewayResponse;

const SECRET: &str = "Writen by ChatGPT-3";

#[derive(Error, Debug, PartialEq)]
pub enum FormatError {
    #[error("Invalid status code")]
    StatusCode,
    #[error("Invalid message")]
    Message,
}

/// Wrap `message` as `{"response": message}` with the standard headers.
///
/// Never fails: a status outside `100..=599` or a message that is not a JSON
/// object yields a 400 envelope describing the problem instead.
pub fn format_response(status_code: u16, message: Value) -> GatewayResponse {
    match validate(status_code, &message) {
        Ok(()) => envelope(status_code, &json!({ "response": message })),
        Err(err) => fallback(&err),
    }
}

/// [`format_response`] for any serializable body.
pub fn respond(status_code: u16, message: impl Serialize) -> GatewayResponse {
    match serde_json::to_value(message) {
        Ok(value) => format_response(status_code, value),
        Err(_) => fallback(&FormatError::Message),
    }
}

fn validate(status_code: u16, message: &Value) -> Result<(), FormatError> {
    if !(100..=599).contains(&status_code) {
        return Err(FormatError::StatusCode);
    }
    if !message.is_object() {
        return Err(FormatError::Message);
    }
    Ok(())
}

fn fallback(err: &FormatError) -> GatewayResponse {
    envelope(400, &json!({ "error": err.to_string() }))
}

fn envelope(status_code: u16, body: &Value) -> GatewayResponse {
    GatewayResponse {
        status_code,
        headers: headers(),
        // serializing a Value cannot fail
        body: body.to_string(),
    }
}

pub fn headers() -> BTreeMap<String, String> {
    [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET,POST,OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type"),
        ("Secret", SECRET),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_owned(), value.to_owned()))
    .collect()
}
