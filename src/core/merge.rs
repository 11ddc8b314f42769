//! Config layer merging
//!
//! - Objects: deep-merge by key
//! - Everything else (scalars, arrays, null): the later layer wins
//! - Plugin sequences: a later layer that declares plugins replaces the sequence.
//!   Callers that need concatenation compose the sequence before merging.
//!
//! Fields a generic merge cannot combine without losing intent are handled by
//! [`DeferredField`] rules: extracted from a layer before merging and reinjected
//! into the result afterwards.

use serde_json::{Map, Value};

use crate::core::config::PartialConfig;

/// Deep merge two JSON values, `overlay` taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_maps(base_map, overlay_map))
        }
        (_, overlay) => overlay,
    }
}

fn merge_maps(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, overlay_value) in overlay {
        let merged = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged);
    }
    base
}

/// Combine layers left to right; later layers take precedence.
pub fn merge<I>(layers: I) -> PartialConfig
where
    I: IntoIterator<Item = PartialConfig>,
{
    layers
        .into_iter()
        .fold(PartialConfig::new(), |merged, layer| {
            let (values, plugins, output_plugins) = merged.into_parts();
            let (layer_values, layer_plugins, layer_output_plugins) = layer.into_parts();

            PartialConfig::from_parts(
                merge_maps(values, layer_values),
                layer_plugins.or(plugins),
                layer_output_plugins.or(output_plugins),
            )
        })
}

/// A field pulled out of a layer before merging and put back afterwards
#[derive(Debug, Clone, Copy)]
pub struct DeferredField {
    pub path: &'static [&'static str],
    pub predicate: fn(&Value) -> bool,
}

impl DeferredField {
    /// Remove the field from `config` when present and matching
    pub fn extract(&self, config: &mut PartialConfig) -> Option<Value> {
        if !config.get(self.path).is_some_and(self.predicate) {
            return None;
        }
        config.remove(self.path)
    }

    pub fn reinject(&self, config: &mut PartialConfig, value: Value) {
        config.set(self.path, value);
    }
}

fn is_literal_true(value: &Value) -> bool {
    value == &Value::Bool(true)
}

/// `ssr.noExternal: true` means "bundle everything". Merged against a structured
/// `noExternal` from another layer it would be corrupted, so it is applied last.
pub const NO_EXTERNAL: DeferredField = DeferredField {
    path: &["ssr", "noExternal"],
    predicate: is_literal_true,
};

/// Rules applied, in order, to the user's config
pub const DEFERRED_FIELDS: &[DeferredField] = &[NO_EXTERNAL];

/// Values extracted from one layer, ready to be reapplied to any number of results
#[derive(Debug, Clone, Default)]
pub struct Deferred {
    extracted: Vec<(DeferredField, Value)>,
}

impl Deferred {
    /// Run every rule in `rules` against `config`, removing the matched fields
    pub fn extract(config: &mut PartialConfig, rules: &[DeferredField]) -> Self {
        let extracted = rules
            .iter()
            .filter_map(|rule| rule.extract(config).map(|value| (*rule, value)))
            .collect();
        Self { extracted }
    }

    pub fn is_empty(&self) -> bool {
        self.extracted.is_empty()
    }

    pub fn contains(&self, path: &[&str]) -> bool {
        self.extracted.iter().any(|(rule, _)| rule.path == path)
    }

    pub fn reinject(&self, config: &mut PartialConfig) {
        for (rule, value) in &self.extracted {
            rule.reinject(config, value.clone());
        }
    }
}
