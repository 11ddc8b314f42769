use crate::core::plugin::Plugin;
use serde_json::{json, Value};

/// A plugin declared in the user's bundler config.
///
/// Opaque to this crate: it is carried through to the bundler as its descriptor.
#[derive(Debug, Clone)]
pub struct ExternalPlugin {
    name: String,
    descriptor: Value,
}

impl ExternalPlugin {
    /// Accepts `"name"` or `{ "name": ..., ... }`; anything else is kept as-is under a
    /// placeholder name.
    pub fn from_descriptor(descriptor: Value) -> Self {
        let name = match &descriptor {
            Value::String(name) => name.clone(),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("anonymous")
                .to_string(),
            _ => "anonymous".to_string(),
        };

        let descriptor = match descriptor {
            Value::String(name) => json!({ "name": name }),
            other => other,
        };

        Self { name, descriptor }
    }
}

impl Plugin for ExternalPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> Value {
        self.descriptor.clone()
    }
}
