// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC wire DTOs (`spec.md` §6): the request/response/prompt shapes that
//! cross a framed-JSON stream.

use max_core::MaxError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scope routing hint carried on a [`Request`] (`spec.md` §4.3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<String>,
}

impl RequestScope {
    pub fn is_empty(&self) -> bool {
        self.workspace_id.is_none() && self.installation_id.is_none()
    }
}

/// `{id, target, method, args, scope?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub target: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<RequestScope>,
}

impl Request {
    pub fn new(id: impl Into<String>, target: impl Into<String>, method: impl Into<String>) -> Self {
        Self { id: id.into(), target: target.into(), method: method.into(), args: Vec::new(), scope: None }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_scope(mut self, scope: RequestScope) -> Self {
        self.scope = if scope.is_empty() { None } else { Some(scope) };
        self
    }
}

/// `{id, ok: true, result}` or `{id, ok: false, error}`.
///
/// `ok` is a JSON boolean, not a string tag, so this can't use serde's
/// built-in internally-tagged representation — it gets a manual impl that
/// matches the wire shape in `spec.md` §6 exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok { id: String, result: Value },
    Err { id: String, error: MaxError },
}

#[derive(Serialize, Deserialize)]
struct ResponseOkWire {
    id: String,
    ok: bool,
    result: Value,
}

#[derive(Serialize, Deserialize)]
struct ResponseErrWire {
    id: String,
    ok: bool,
    error: MaxError,
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Response::Ok { id, result } => {
                ResponseOkWire { id: id.clone(), ok: true, result: result.clone() }.serialize(serializer)
            }
            Response::Err { id, error } => {
                ResponseErrWire { id: id.clone(), ok: false, error: error.clone() }.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let ok = value.get("ok").and_then(Value::as_bool).ok_or_else(|| {
            serde::de::Error::custom("response missing boolean `ok` field")
        })?;
        if ok {
            let wire: ResponseOkWire = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            Ok(Response::Ok { id: wire.id, result: wire.result })
        } else {
            let wire: ResponseErrWire = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            Ok(Response::Err { id: wire.id, error: wire.error })
        }
    }
}

impl Response {
    pub fn ok(id: impl Into<String>, result: Value) -> Self {
        Response::Ok { id: id.into(), result }
    }

    pub fn err(id: impl Into<String>, error: MaxError) -> Self {
        Response::Err { id: id.into(), error }
    }

    pub fn id(&self) -> &str {
        match self {
            Response::Ok { id, .. } | Response::Err { id, .. } => id,
        }
    }

    pub fn into_result(self) -> Result<Value, MaxError> {
        match self {
            Response::Ok { result, .. } => Ok(result),
            Response::Err { error, .. } => Err(error),
        }
    }
}

/// Daemon-to-client and client-to-daemon halves of an input-prompt
/// exchange, multiplexed on the same connection as request/response pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptMessage {
    Prompt { text: String },
    Input { value: String },
}

/// Any one line on the wire: a request, a response, or a prompt exchange
/// message. Frames are distinguished structurally, not by an envelope tag,
/// matching `spec.md` §4.2's "a message is either a request, a response,
/// or a platform-specific input-prompt exchange".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    Request(Request),
    Response(Response),
    Prompt(PromptMessage),
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
