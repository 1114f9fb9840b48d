use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed `sub` value marking a user session token.
pub const SUBJECT: &str = "user";

/// Claim names the service sets itself; caller-supplied entries with these
/// names are dropped.
pub const RESERVED_CLAIMS: [&str; 4] = ["sub", "exp", "iat", "userId"];

/// Decoded claim set of a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Issued-at, unix seconds. Absent in tokens minted without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(rename = "userId")]
    pub user_id: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Look up any claim by its wire name, reserved or not.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "sub" => Some(Value::from(self.sub.as_str())),
            "exp" => Some(Value::from(self.exp)),
            "iat" => self.iat.map(Value::from),
            "userId" => Some(self.user_id.clone()),
            _ => self.extra.get(key).cloned(),
        }
    }
}
