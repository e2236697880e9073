//! Wire envelopes
//!
//! ```text
//! -> {"id": 7, "method": "create", "params": {"urn": "...", "inputs": {...}}}
//! <- {"id": 7, "result": {"id": "...", "outs": {...}}}
//! <- {"id": 7, "error": {"code": "not_implemented", "message": "..."}}
//! ```
//!
//! A line that cannot be parsed at all is answered with `"id": null`.

use std::fmt;
use std::str::FromStr;

use carrier_provider::ProviderError;
use serde::{Deserialize, Serialize};

/// Code for malformed lines, unknown methods and undecodable params.
pub const INVALID_REQUEST: &str = "invalid_request";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Option<u64>,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBody {
    Result(serde_json::Value),
    Error(ErrorBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl Response {
    pub fn result(id: u64, value: serde_json::Value) -> Self {
        Self { id: Some(id), body: ResponseBody::Result(value) }
    }

    pub fn error(id: Option<u64>, error: ErrorBody) -> Self {
        Self { id, body: ResponseBody::Error(error) }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, ResponseBody::Error(_))
    }
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }
}

impl From<ProviderError> for ErrorBody {
    fn from(err: ProviderError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// Methods understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    PluginInfo,
    Check,
    Diff,
    Create,
    Read,
    Update,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PluginInfo => "pluginInfo",
            Self::Check => "check",
            Self::Diff => "diff",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown method '{0}'")]
pub struct ParseMethodError(pub String);

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pluginInfo" => Ok(Self::PluginInfo),
            "check" => Ok(Self::Check),
            "diff" => Ok(Self::Diff),
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(ParseMethodError(other.to_string())),
        }
    }
}
