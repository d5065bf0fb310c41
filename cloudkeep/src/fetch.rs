//! Fetching and boundary validation of configuration objects.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// One policy/profile as returned by a listing endpoint.
///
/// Objects stay loosely typed - a key-ordered JSON map - because the server
/// is free to add fields at any time and the export must round-trip them
/// untouched. Required fields (`id`, `displayName`) are checked at the fetch
/// and pre-export boundaries only.
#[derive(Debug, Clone)]
pub struct ConfigObject(Map<String, Value>);

impl ConfigObject {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn display_name(&self) -> Option<&str> {
        self.get_str("displayName")
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Remove a key if present. Absent keys are ignored.
    pub fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Fetch all configuration objects from a listing endpoint.
///
/// The endpoint must answer with the `{"value": [...]}` envelope; anything
/// else is an unexpected response. Elements without a string `id` are
/// rejected here so downstream code can rely on it.
pub async fn fetch_objects(transport: &dyn Transport, endpoint: &str) -> Result<Vec<ConfigObject>> {
    let body = transport.get(endpoint).await?;

    let items = body
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            reason: "missing top-level `value` array".to_string(),
        })?;

    let mut objects = Vec::with_capacity(items.len());
    for item in items {
        let object =
            ConfigObject::from_value(item.clone()).filter(|o| o.id().is_some()).ok_or_else(|| {
                Error::UnexpectedResponse {
                    endpoint: endpoint.to_string(),
                    reason: "listing element without a string `id`".to_string(),
                }
            })?;
        objects.push(object);
    }

    Ok(objects)
}
