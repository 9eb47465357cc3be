use crate::application_port::AuthError;
use crate::domain_model::AccessToken;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request addressed to the identity service, relative to its base url.
///
/// Requests are plain data so that the authorizer can clone one and resend it
/// with a different bearer credential.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub bearer: Option<AccessToken>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, AuthError> {
        let body = serde_json::to_value(body)
            .map_err(|e| AuthError::InternalError(format!("serialize request body: {}", e)))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_bearer(&self, token: AccessToken) -> Self {
        let mut request = self.clone();
        request.bearer = Some(token);
        request
    }

    /// Path without query string or fragment.
    pub fn route(&self) -> &str {
        let end = self.path.find(['?', '#']).unwrap_or(self.path.len());
        &self.path[..end]
    }
}

pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_FORBIDDEN: u16 = 403;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == STATUS_UNAUTHORIZED
    }

    pub fn is_forbidden(&self) -> bool {
        self.status == STATUS_FORBIDDEN
    }

    /// Classifies a non-2xx response into the error taxonomy. This is the only
    /// place where error bodies are inspected.
    pub fn error_for_status(self) -> Result<Self, AuthError> {
        if self.is_success() {
            return Ok(self);
        }
        if self.is_unauthorized() {
            return Err(AuthError::Unauthorized);
        }
        if self.is_forbidden() {
            return Err(AuthError::Forbidden);
        }
        match self.status {
            STATUS_BAD_REQUEST => Err(AuthError::Validation(FieldErrors::from_body(
                self.body.as_ref(),
            ))),
            status => Err(AuthError::Api {
                status,
                detail: detail_of(self.body.as_ref()),
            }),
        }
    }

    pub fn json<T: DeserializeOwned>(self) -> Result<T, AuthError> {
        let body = self.body.unwrap_or(Value::Null);
        serde_json::from_value(body)
            .map_err(|e| AuthError::Transport(format!("unexpected response body: {}", e)))
    }

    pub fn detail(&self) -> Option<String> {
        detail_of(self.body.as_ref())
    }
}

/// Body of endpoints that only acknowledge, e.g. `{"detail": "Password changed."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub detail: Option<String>,
}

fn detail_of(body: Option<&Value>) -> Option<String> {
    match body? {
        Value::Object(map) => map.get("detail").and_then(message_of),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn message_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(message_of),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Field-level validation messages keyed by field name. Errors that are not
/// tied to a field are kept under `detail` or `non_field_errors`, as sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn from_body(body: Option<&Value>) -> Self {
        let mut fields = BTreeMap::new();
        match body {
            Some(Value::Object(map)) => {
                for (field, value) in map {
                    let messages = messages_of(value);
                    if !messages.is_empty() {
                        fields.insert(field.clone(), messages);
                    }
                }
            }
            Some(Value::Array(_)) | Some(Value::String(_)) => {
                let messages = body.map(messages_of).unwrap_or_default();
                if !messages.is_empty() {
                    fields.insert("non_field_errors".to_string(), messages);
                }
            }
            _ => {}
        }
        FieldErrors(fields)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(messages_of).collect(),
        Value::Object(map) => map.values().flat_map(messages_of).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}
