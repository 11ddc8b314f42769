use crate::core::config::{EffectiveConfig, PartialConfig};
use crate::core::models::{BuildOptions, BundleOutput};
use crate::utils::{ModeContext, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// What the bundler's config discovery is told about the run
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEnv {
    pub command: &'static str,
    pub mode: ModeContext,
    pub root: PathBuf,
}

impl ConfigEnv {
    pub fn build(root: impl Into<PathBuf>, mode: ModeContext) -> Self {
        Self {
            command: "build",
            mode,
            root: root.into(),
        }
    }
}

/// The external bundling engine
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Discover and load the user's config file. `None` when there is none.
    async fn load_user_config(&self, env: &ConfigEnv) -> Result<Option<PartialConfig>>;

    /// Run one build and report what was emitted
    async fn build(&self, config: &EffectiveConfig) -> Result<BundleOutput>;
}

/// Best-effort environment normalization run before every build
#[async_trait]
pub trait PatchHook: Send + Sync {
    async fn apply(&self, options: &BuildOptions) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPatchHook;

#[async_trait]
impl PatchHook for NoopPatchHook {
    async fn apply(&self, _options: &BuildOptions) -> Result<()> {
        Ok(())
    }
}

/// Locates vendor-pinned runtime modules
#[async_trait]
pub trait VendorResolver: Send + Sync {
    async fn resolve(&self, specifier: &str, root: &Path) -> Result<PathBuf>;
}

/// File system operations interface
#[async_trait]
pub trait FileSystemService: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;
    async fn read_json(&self, path: &Path) -> Result<Value>;
}
