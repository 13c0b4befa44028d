use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Inbound request at the invocation boundary, shaped like an API Gateway
/// proxy event. Fields this service does not use are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Outbound envelope returned by both handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct PasteSubmitted {
    pub message: &'static str,
    pub id: String,
    pub timestamp: String,
    pub raw_data: String,
    pub paste: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joke: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PasteRetrieved {
    pub message: &'static str,
    pub id: String,
    pub paste: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joke: Option<String>,
    pub creator_gh_user: String,
    pub recipient_gh_username: String,
}

#[derive(Debug, Serialize)]
pub struct PasteNotFound {
    pub message: &'static str,
    pub id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joke: Option<String>,
}

/// Body for validation failures and other short notices.
#[derive(Debug, Serialize)]
pub struct Notice {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joke: Option<String>,
}

/// Body for 5xx responses. Carries a stable code, never error text.
#[derive(Debug, Serialize)]
pub struct Failure {
    pub error: &'static str,
    pub message: &'static str,
}
