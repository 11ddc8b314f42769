use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config::EffectiveConfig;
use crate::plugins::RemoveUnusedImportsPlugin;

/// Virtual module both targets are built from
pub const ENTRY_MODULE: &str = "virtual:app-entry";
/// Distribution root, cleaned on every run
pub const OUT_DIR: &str = "dist";
pub const CLIENT_OUT_DIR: &str = "dist/client";
pub const SERVER_OUT_DIR: &str = "dist/server";
/// The bundler's dependency pre-bundling cache, cleaned on every run
pub const DEPS_CACHE_DIR: &str = "node_modules/.vite";
/// Manifest the client build emits and the server phase reads back
pub const CLIENT_MANIFEST_PATH: &str = "dist/client/.vite/manifest.json";
/// `BuildArgs::step` value that skips the client phase
pub const GENERATE_STEP: &str = "generate";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_VENDOR_PACKAGE: &str = "@dualbuild/vendor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    Client,
    Server,
}

impl BuildTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildTarget::Client => "client",
            BuildTarget::Server => "server",
        }
    }
}

impl std::fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module format of the server bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerOutputFormat {
    #[default]
    Esm,
    Cjs,
}

impl ServerOutputFormat {
    /// Unrecognized names yield `None` and leave the bundler's default in place
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "esm" => Some(ServerOutputFormat::Esm),
            "cjs" => Some(ServerOutputFormat::Cjs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

/// `build.server`: `false` disables the server phase, an object configures it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerBuildOption {
    Toggle(bool),
    Options(ServerOptions),
}

impl Default for ServerBuildOption {
    fn default() -> Self {
        ServerBuildOption::Toggle(true)
    }
}

impl ServerBuildOption {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ServerBuildOption::Toggle(false))
    }

    pub fn output_format(&self) -> ServerOutputFormat {
        match self {
            ServerBuildOption::Options(ServerOptions {
                output_format: Some(name),
            }) => ServerOutputFormat::parse(name).unwrap_or_default(),
            _ => ServerOutputFormat::Esm,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSettings {
    pub server: ServerBuildOption,
    pub analyze: bool,
}

/// Packages forced into (or kept out of) dependency pre-bundling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepsSettings {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Fully resolved options for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    pub root: PathBuf,
    pub host: String,
    pub port: u16,
    pub build: BuildSettings,
    pub deps: DepsSettings,
    pub vendor_package: String,
}

impl BuildOptions {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            build: BuildSettings::default(),
            deps: DepsSettings::default(),
            vendor_package: DEFAULT_VENDOR_PACKAGE.to_string(),
        }
    }

    pub fn client_manifest_path(&self) -> PathBuf {
        self.root.join(CLIENT_MANIFEST_PATH)
    }
}

/// Per-invocation flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default)]
    pub analyze: bool,
}

impl BuildArgs {
    pub fn generate_only() -> Self {
        Self {
            step: Some(GENERATE_STEP.to_string()),
            analyze: false,
        }
    }

    pub fn skips_client(&self) -> bool {
        self.step.as_deref() == Some(GENERATE_STEP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Chunk,
    Asset,
}

/// One emitted file as reported by the bundler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputChunk {
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub is_entry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl OutputChunk {
    pub fn chunk(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Chunk,
            file_name: file_name.into(),
            code: Some(code.into()),
            is_entry: false,
            size: None,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.size
            .or_else(|| self.code.as_ref().map(String::len))
            .unwrap_or(0)
    }
}

/// What the bundler hands back for one build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleOutput {
    #[serde(default)]
    pub output: Vec<OutputChunk>,
}

/// Module-resolution aliases pinning runtime imports in the server build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerResolve {
    pub alias: Vec<(String, PathBuf)>,
}

impl ServerResolve {
    pub fn get(&self, specifier: &str) -> Option<&Path> {
        self.alias
            .iter()
            .find(|(from, _)| from == specifier)
            .map(|(_, to)| to.as_path())
    }

    pub fn to_value(&self) -> Value {
        let alias: Map<String, Value> = self
            .alias
            .iter()
            .map(|(from, to)| (from.clone(), Value::String(to.to_string_lossy().into_owned())))
            .collect();
        serde_json::json!({ "alias": alias })
    }
}

/// Everything a run produced, handed to the packaging step
#[derive(Debug)]
pub struct BuildResult {
    pub options: BuildOptions,
    pub build_args: BuildArgs,
    pub client_output: Option<Vec<OutputChunk>>,
    pub server_output: Option<Vec<OutputChunk>>,
    pub remove_unused_imports: Arc<RemoveUnusedImportsPlugin>,
    pub server_resolve: ServerResolve,
    pub client_config: EffectiveConfig,
    pub server_config: EffectiveConfig,
    pub client_manifest: Option<Value>,
}
