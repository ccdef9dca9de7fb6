//! Response schemas for each endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a successful `POST /token/`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Credentials sent to `POST /token/`. Never persisted.
#[derive(Serialize)]
pub(crate) struct CredentialsBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// The signed-in user as returned by `GET /users/me/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        let name = format!("{} {}", first, last).trim().to_string();
        if name.is_empty() {
            "(no name)".to_string()
        } else {
            name
        }
    }

    /// Extract the profile from a `/users/me/` body.
    ///
    /// The server answers either with the profile object itself or with it
    /// wrapped in `data`. Anything that is not an object carrying at least
    /// an email is rejected.
    pub(crate) fn from_body(body: Value) -> Result<Self, String> {
        let fields = match body {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Object(inner)) => inner,
                Some(other) => return Err(format!("`data` is {}, expected an object", json_kind(&other))),
                None => map,
            },
            other => return Err(format!("body is {}, expected an object", json_kind(&other))),
        };
        serde_json::from_value(Value::Object(fields)).map_err(|e| e.to_string())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Body of `GET /test-token/`.
///
/// The server decides what to echo back; the only guarantee checked here is
/// that it is a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TokenCheck(pub Map<String, Value>);

impl TokenCheck {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Indented JSON for display
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}
