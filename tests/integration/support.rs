use async_trait::async_trait;
use dualbuild::core::config::{EffectiveConfig, PartialConfig};
use dualbuild::core::interfaces::{Bundler, ConfigEnv, PatchHook, VendorResolver};
use dualbuild::core::models::{
    BuildOptions, BuildTarget, BundleOutput, OutputChunk, CLIENT_MANIFEST_PATH,
};
use dualbuild::core::services::DualBuildService;
use dualbuild::utils::{DualBuildConfig, DualBuildError, EnvSnapshot, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory bundler that records every build and writes a tiny output tree
#[derive(Default)]
pub struct RecordingBundler {
    pub user_config: Option<Value>,
    pub fail_on: Option<BuildTarget>,
    /// Target whose build writes the client manifest. `None` means the client.
    pub manifest_on: Option<BuildTarget>,
    pub builds: Mutex<Vec<(BuildTarget, Value)>>,
}

impl RecordingBundler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_config(mut self, config: Value) -> Self {
        self.user_config = Some(config);
        self
    }

    pub fn failing_on(mut self, target: BuildTarget) -> Self {
        self.fail_on = Some(target);
        self
    }

    pub fn targets(&self) -> Vec<BuildTarget> {
        self.builds.lock().unwrap().iter().map(|(target, _)| *target).collect()
    }
}

#[async_trait]
impl Bundler for RecordingBundler {
    async fn load_user_config(&self, _env: &ConfigEnv) -> Result<Option<PartialConfig>> {
        self.user_config
            .clone()
            .map(PartialConfig::from_value)
            .transpose()
    }

    async fn build(&self, config: &EffectiveConfig) -> Result<BundleOutput> {
        let target = config.target();
        self.builds.lock().unwrap().push((target, config.to_value()));

        if self.fail_on == Some(target) {
            return Err(DualBuildError::bundler_with_diagnostics(
                target,
                "bundler exited with exit status: 1",
                "Could not resolve entry module",
            ));
        }

        let root = config.root().unwrap_or_else(|| PathBuf::from("."));
        let out_dir = root.join(config.out_dir().unwrap_or("dist"));
        std::fs::create_dir_all(&out_dir)?;
        let code = format!("export const target = \"{}\";\n", target);
        std::fs::write(out_dir.join("entry.js"), &code)?;

        if self.manifest_on.unwrap_or(BuildTarget::Client) == target {
            let manifest = root.join(CLIENT_MANIFEST_PATH);
            std::fs::create_dir_all(manifest.parent().unwrap())?;
            std::fs::write(
                manifest,
                r#"{ "virtual:app-entry": { "file": "assets/entry.js", "isEntry": true } }"#,
            )?;
        }

        Ok(BundleOutput {
            output: vec![OutputChunk::chunk("entry.js", code)],
        })
    }
}

/// Maps `<vendor>/<module>` straight under `node_modules`
pub struct FlatVendorResolver;

#[async_trait]
impl VendorResolver for FlatVendorResolver {
    async fn resolve(&self, specifier: &str, root: &Path) -> Result<PathBuf> {
        Ok(root.join("node_modules").join(format!("{}.js", specifier)))
    }
}

/// A workspace without the vendor package installed
pub struct MissingVendorResolver;

#[async_trait]
impl VendorResolver for MissingVendorResolver {
    async fn resolve(&self, specifier: &str, root: &Path) -> Result<PathBuf> {
        Err(DualBuildError::Resolve(format!(
            "{} from {}",
            specifier,
            root.display()
        )))
    }
}

pub struct FailingPatchHook {
    pub calls: AtomicUsize,
}

impl FailingPatchHook {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatchHook for FailingPatchHook {
    async fn apply(&self, _options: &BuildOptions) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("package.json is read-only").into())
    }
}

pub fn service(bundler: Arc<RecordingBundler>) -> DualBuildService {
    DualBuildService::new(bundler)
        .with_vendor_resolver(Arc::new(FlatVendorResolver))
        .with_env(EnvSnapshot::from_vars([("API_URL", "https://api.example.com")]))
}

pub fn project_config(root: &Path) -> DualBuildConfig {
    DualBuildConfig {
        root: Some(root.to_path_buf()),
        ..Default::default()
    }
}
