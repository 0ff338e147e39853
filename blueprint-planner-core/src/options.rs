//! Typed option bags for the plugins a plan can reference.
//!
//! Every bag is turned into a JSON object with keys sorted at every depth before it is
//! attached to a [`PluginTask`](crate::contract::PluginTask), which keeps serialized
//! plans byte-stable regardless of how the input objects were ordered.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CompileError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitextractorOptions<'a> {
    pub proxy: &'a str,
    pub repo_id: &'a str,
    /// Clone URL with credentials embedded; never log it.
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoraOptions<'a> {
    pub repo_id: &'a str,
    pub tasks: &'a [String],
    pub transformation: &'a Map<String, Value>,
}

/// Serializes `options` into a sorted JSON object.
pub fn option_bag<T: Serialize>(plugin: &str, options: &T) -> Result<Map<String, Value>, CompileError> {
    let value = serde_json::to_value(options).map_err(|source| CompileError::OptionEncoding {
        plugin: plugin.to_string(),
        source,
    })?;
    match sort_keys(value) {
        Value::Object(map) => Ok(map),
        _ => Err(CompileError::OptionEncoding {
            plugin: plugin.to_string(),
            source: serde::ser::Error::custom("options must serialize to a JSON object"),
        }),
    }
}

/// Rebuilds every object inside `value` with its keys in sorted order.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sort_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Explicit so plans stay sorted even when serde_json's `preserve_order` feature is on.
pub fn sort_map(map: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
        .into_iter()
        .map(|(key, value)| (key, sort_keys(value)))
        .collect()
}
