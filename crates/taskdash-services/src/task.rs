//! Task types exchanged with the dashboard's `/api/todos/` endpoints.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned task identifier.
///
/// Opaque to the client: it is compared for equality and formatted into
/// request paths. The dashboard hands out integers, but string ids are
/// accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Integer ids go back out as numbers.
        match self.0.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Str(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => TaskId::from(n),
            RawId::Str(s) => TaskId(s),
        })
    }
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub is_done: bool,
}

/// Request to create a new task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskCreateRequest {
    pub text: String,
}

/// Body returned by the toggle endpoint.
///
/// The dashboard answers `{"status": "updated", "is_done": true}`; a full task
/// record is accepted as well since only `is_done` is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_done: Option<bool>,
}

impl ToggleResponse {
    /// The done flag after the toggle: the server's value when it sent one,
    /// otherwise the flip of `previous`.
    pub fn resolve(&self, previous: bool) -> bool {
        self.is_done.unwrap_or(!previous)
    }
}
