use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::models::BuildTarget;
use crate::core::plugin::Plugin;
use crate::plugins::ExternalPlugin;
use crate::utils::{DualBuildError, Result};

const PLUGINS_KEY: &str = "plugins";
const OUTPUT_PLUGINS_PATH: [&str; 3] = ["build", "rollupOptions", "plugins"];

/// One layer of bundler configuration.
///
/// Plain fields live in a JSON object. The two plugin sequences (`plugins` and
/// `build.rollupOptions.plugins`) are held as live plugin objects and rendered as
/// descriptors by [`PartialConfig::to_value`].
#[derive(Clone, Default)]
pub struct PartialConfig {
    values: Map<String, Value>,
    plugins: Option<Vec<Arc<dyn Plugin>>>,
    output_plugins: Option<Vec<Arc<dyn Plugin>>>,
}

impl PartialConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a layer from JSON. `null` is an empty layer; any plugin entries become
    /// [`ExternalPlugin`]s.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut values = match value {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(DualBuildError::config(format!(
                    "bundler config must be an object, got {}",
                    other
                )))
            }
        };

        let plugins = values.remove(PLUGINS_KEY).map(external_plugins);
        let mut config = Self {
            values,
            plugins,
            output_plugins: None,
        };
        config.output_plugins = config.remove(&OUTPUT_PLUGINS_PATH).map(external_plugins);
        Ok(config)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_parts(self) -> (Map<String, Value>, Option<Vec<Arc<dyn Plugin>>>, Option<Vec<Arc<dyn Plugin>>>) {
        (self.values, self.plugins, self.output_plugins)
    }

    pub fn from_parts(
        values: Map<String, Value>,
        plugins: Option<Vec<Arc<dyn Plugin>>>,
        output_plugins: Option<Vec<Arc<dyn Plugin>>>,
    ) -> Self {
        Self {
            values,
            plugins,
            output_plugins,
        }
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        self.plugins.as_deref().unwrap_or(&[])
    }

    pub fn output_plugins(&self) -> &[Arc<dyn Plugin>] {
        self.output_plugins.as_deref().unwrap_or(&[])
    }

    pub fn with_plugins(mut self, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        self.plugins = Some(plugins);
        self
    }

    pub fn with_output_plugins(mut self, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        self.output_plugins = Some(plugins);
        self
    }

    pub fn with(mut self, path: &[&str], value: Value) -> Self {
        self.set(path, value);
        self
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.values.get(*first)?, |current, key| current.get(*key))
    }

    /// Set a value, creating intermediate objects. Non-object intermediates are replaced.
    pub fn set(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };

        let mut current = &mut self.values;
        for key in parents {
            let slot = current
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }
        current.insert(last.to_string(), value);
    }

    /// Remove a value. Emptied parent objects are left in place.
    pub fn remove(&mut self, path: &[&str]) -> Option<Value> {
        let (last, parents) = path.split_last()?;

        let mut current = &mut self.values;
        for key in parents {
            current = current.get_mut(*key)?.as_object_mut()?;
        }
        current.remove(*last)
    }

    /// JSON form handed to the bundler
    pub fn to_value(&self) -> Value {
        let mut rendered = self.clone();
        if let Some(plugins) = &self.output_plugins {
            rendered.set(&OUTPUT_PLUGINS_PATH, descriptors(plugins));
        }
        let mut values = rendered.values;
        if let Some(plugins) = &self.plugins {
            values.insert(PLUGINS_KEY.to_string(), descriptors(plugins));
        }
        Value::Object(values)
    }
}

impl std::fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialConfig")
            .field("values", &self.values)
            .field("plugins", &plugin_names(self.plugins()))
            .field("output_plugins", &plugin_names(self.output_plugins()))
            .finish()
    }
}

/// The config actually passed to the bundler for one target
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    target: BuildTarget,
    config: PartialConfig,
}

impl EffectiveConfig {
    pub(crate) fn new(target: BuildTarget, config: PartialConfig) -> Self {
        Self { target, config }
    }

    pub fn target(&self) -> BuildTarget {
        self.target
    }

    pub fn config(&self) -> &PartialConfig {
        &self.config
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        self.config.get(path)
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        self.config.plugins()
    }

    pub fn output_plugins(&self) -> &[Arc<dyn Plugin>] {
        self.config.output_plugins()
    }

    /// Project root the config was assembled for
    pub fn root(&self) -> Option<PathBuf> {
        self.get(&["root"]).and_then(Value::as_str).map(PathBuf::from)
    }

    /// Output directory, relative to the root
    pub fn out_dir(&self) -> Option<&str> {
        self.get(&["build", "outDir"]).and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        self.config.to_value()
    }
}

fn external_plugins(value: Value) -> Vec<Arc<dyn Plugin>> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    entries
        .into_iter()
        // falsy entries (`cond && plugin()`) are skipped by bundlers
        .filter(|entry| !matches!(entry, Value::Null | Value::Bool(false)))
        .map(|entry| Arc::new(ExternalPlugin::from_descriptor(entry)) as Arc<dyn Plugin>)
        .collect()
}

fn descriptors(plugins: &[Arc<dyn Plugin>]) -> Value {
    Value::Array(plugins.iter().map(|plugin| plugin.descriptor()).collect())
}

fn plugin_names(plugins: &[Arc<dyn Plugin>]) -> Vec<&str> {
    plugins.iter().map(|plugin| plugin.name()).collect()
}
