use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ffi::OsString;

/// Environment flag that layers the no-minify/no-treeshake override onto the client build
pub const DISABLE_PROD_OPTIMIZATION_VAR: &str = "DUALBUILD_DISABLE_PROD_OPTIMIZATION";

/// Build mode for a run.
///
/// Constructed once at the start of a run and passed explicitly to config discovery
/// and to the bundler process, instead of writing `NODE_ENV` into the process-global
/// environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeContext {
    Production,
}

impl ModeContext {
    pub fn production() -> Self {
        ModeContext::Production
    }

    /// Value exported as `NODE_ENV`
    pub fn node_env(&self) -> &'static str {
        match self {
            ModeContext::Production => "production",
        }
    }

    /// Mode name handed to the bundler's config discovery
    pub fn config_mode(&self) -> &'static str {
        match self {
            ModeContext::Production => "prod",
        }
    }
}

/// Point-in-time copy of the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    variables: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Keys and values that are not
    /// valid unicode are decoded lossily, so every variable keeps its entry.
    pub fn capture() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        Self::from_vars(vars.into_iter().map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        }))
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            variables: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Overlay the mode's `NODE_ENV` so every consumer of the snapshot observes it
    pub fn with_mode(mut self, mode: ModeContext) -> Self {
        self.variables
            .insert("NODE_ENV".to_string(), mode.node_env().to_string());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// A flag is set when the variable exists and is non-empty
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_empty())
    }

    /// Compile-time defines for the server build: `process.env.KEY` → JSON string literal.
    ///
    /// Every variable is exposed. The server bundle never ships to browsers.
    pub fn to_defines(&self) -> Map<String, Value> {
        self.variables
            .iter()
            .map(|(key, value)| {
                (
                    format!("process.env.{}", key),
                    Value::String(json_string_literal(value)),
                )
            })
            .collect()
    }
}

fn json_string_literal(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}
