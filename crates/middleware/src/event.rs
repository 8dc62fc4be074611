//! Event records carried through the chains.

use std::{path::PathBuf, sync::Arc};

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    switchyard_config::SwitchyardConfig,
};

use crate::error::{Error, Result};

/// Host state attached to every event before it enters a chain.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub data_dir: PathBuf,
    pub config: SwitchyardConfig,
}

impl HostContext {
    pub fn new(data_dir: PathBuf, config: SwitchyardConfig) -> Self {
        Self { data_dir, config }
    }
}

/// A structured event.
///
/// `type`, `platform` and `text` are required strings; `raw` is an arbitrary
/// payload from the producing transport. Unknown top-level fields are kept in
/// `extra` so they survive the trip through the chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub platform: String,
    pub text: String,
    #[serde(default)]
    pub raw: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Back-reference to the host, set by the dispatcher.
    #[serde(skip)]
    pub host: Option<Arc<HostContext>>,
}

impl Event {
    pub fn new(kind: impl Into<String>, platform: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            platform: platform.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    /// Validate an untyped record and convert it into an [`Event`].
    ///
    /// The record must be a JSON object whose `type`, `platform` and `text`
    /// members are strings. `raw` may hold anything, or be absent.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::invalid_event(format!(
                    "expected an object, got {}",
                    json_kind(&other)
                )));
            },
        };

        let kind = take_string(&mut map, "type")?;
        let platform = take_string(&mut map, "platform")?;
        let text = take_string(&mut map, "text")?;
        let raw = map.remove("raw").unwrap_or(Value::Null);

        Ok(Self {
            kind,
            platform,
            text,
            raw,
            extra: map,
            host: None,
        })
    }

    /// Validate a batch of untyped records. An empty batch is rejected, and
    /// the first malformed record rejects the whole batch.
    pub fn from_batch(values: Vec<Value>) -> Result<Vec<Self>> {
        if values.is_empty() {
            return Err(Error::EmptyDispatch);
        }
        values.into_iter().map(Self::from_value).collect()
    }

    /// JSON rendering used in log lines. Never fails.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

fn take_string(map: &mut Map<String, Value>, field: &str) -> Result<String> {
    match map.remove(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(Error::invalid_event(format!(
            "field `{field}` must be a string, got {}",
            json_kind(&other)
        ))),
        None => Err(Error::invalid_event(format!("missing field `{field}`"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
