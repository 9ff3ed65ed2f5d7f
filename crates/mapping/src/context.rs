//! Render-context construction.
//!
//! A render context is the flat key/value map a single render call draws
//! from. It merges three layers, later layers winning ties:
//!
//! 1. mapped aliases; mapping entries whose value is a dot-path string,
//!    resolved against the payload,
//! 2. literal overrides; mapping entries with any non-string value,
//! 3. the payload's own top-level keys.
//!
//! Reserved keys (leading underscore) are layout configuration, not data:
//! they pass through untouched and are never drawable.

use crate::path::lookup_path;
use serde_json::{Map, Value};

pub const RESERVED_PREFIX: char = '_';

/// True for keys that name layout configuration rather than data fields.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// The flat field map for one render call. Created per call, never persisted.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    values: Map<String, Value>,
}

impl RenderContext {
    /// Builds the context from a raw payload and the template's mapping table.
    pub fn resolve(payload: &Value, mapping: &Map<String, Value>) -> Self {
        let mut values = Map::new();

        for (key, source) in mapping {
            if is_reserved_key(key) {
                // Layout sections ride along opaquely for downstream readers.
                values.insert(key.clone(), source.clone());
                continue;
            }
            match source {
                Value::String(path) => {
                    if let Some(found) = lookup_path(payload, path) {
                        values.insert(key.clone(), found.clone());
                    }
                }
                literal => {
                    values.insert(key.clone(), literal.clone());
                }
            }
        }

        // The raw payload wins key-for-key over aliases and literals alike.
        if let Some(top) = payload.as_object() {
            for (key, value) in top {
                values.insert(key.clone(), value.clone());
            }
        }

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Iterates drawable entries only; reserved keys are filtered out.
    pub fn data_entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter().filter(|(k, _)| !is_reserved_key(k))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The text rendered for a field value: strings verbatim, scalars via
    /// their display form, null and absent as the empty string. Containers
    /// fall back to compact JSON.
    pub fn display_value(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => other.to_string(),
        }
    }
}
