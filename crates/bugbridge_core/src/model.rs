//! Wire shapes of the Sentry and Bugzilla payloads, limited to the fields the
//! bridge reads. Unknown fields are ignored; missing and `null` ones default.
use serde::{Deserialize, Deserializer, Serialize};

/// Sentry sends `null` for absent strings and lists as often as it omits them.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(rename = "sentry.interfaces.Exception")]
    pub exception: Option<ExceptionInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionInterface {
    #[serde(deserialize_with = "null_as_default")]
    pub values: Vec<ExceptionValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionValue {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
    pub stacktrace: Option<Stacktrace>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stacktrace {
    #[serde(deserialize_with = "null_as_default")]
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub function: Option<String>,
    pub filename: Option<String>,
    pub module: Option<String>,
    pub lineno: Option<u64>,
    pub colno: Option<u64>,
}

impl Frame {
    /// Source location: the filename, or the module for frames without one.
    pub fn location(&self) -> Option<&str> {
        self.filename.as_deref().or(self.module.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bug {
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BugList {
    #[serde(deserialize_with = "null_as_default")]
    pub bugs: Vec<Bug>,
}
