// Plugin model for the bundler configs this crate assembles.
// Plugins travel inside a config; the bundler drives their hooks.

use crate::core::models::OutputChunk;
use crate::utils::Result;
use serde_json::{json, Value};
use std::sync::Arc;

/// Ordering hint understood by the bundler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforce {
    Pre,
    Post,
}

impl Enforce {
    pub fn as_str(&self) -> &'static str {
        match self {
            Enforce::Pre => "pre",
            Enforce::Post => "post",
        }
    }
}

/// Result of a `render_chunk` hook
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChunk {
    pub code: String,
    pub map: Option<String>,
}

/// A bundler plugin.
///
/// Module-level behavior is carried by the descriptor and executed by the
/// bundler. `render_chunk` runs here, per emitted code chunk.
pub trait Plugin: Send + Sync {
    /// Unique name for this plugin
    fn name(&self) -> &str;

    fn enforce(&self) -> Option<Enforce> {
        None
    }

    /// JSON form of the plugin as it appears in a serialized config
    fn descriptor(&self) -> Value {
        let mut descriptor = json!({ "name": self.name() });
        if let Some(enforce) = self.enforce() {
            descriptor["enforce"] = Value::String(enforce.as_str().to_string());
        }
        descriptor
    }

    /// Return Some(rendered) to replace the chunk, None to leave it unchanged.
    fn render_chunk(&self, _code: &str, _chunk: &OutputChunk) -> Result<Option<RenderedChunk>> {
        Ok(None)
    }
}

impl std::fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Plugin({})", self.name())
    }
}

/// Runs the hooks of an ordered plugin list
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Plugins with `enforce: pre` run first, `post` last, registration order otherwise
    pub fn from_plugins(plugins: &[Arc<dyn Plugin>]) -> Self {
        let mut manager = Self::new();
        let rank = |plugin: &Arc<dyn Plugin>| match plugin.enforce() {
            Some(Enforce::Pre) => 0,
            None => 1,
            Some(Enforce::Post) => 2,
        };
        let mut ordered = plugins.to_vec();
        ordered.sort_by_key(rank);
        for plugin in ordered {
            manager.register(plugin);
        }
        manager
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Each plugin receives the output of the previous one.
    pub fn render_chunk(&self, mut code: String, chunk: &OutputChunk) -> Result<String> {
        for plugin in &self.plugins {
            if let Some(rendered) = plugin.render_chunk(&code, chunk)? {
                code = rendered.code;
            }
        }
        Ok(code)
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
