use crate::core::interfaces::VendorResolver;
use crate::utils::{DualBuildError, Logger, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];
/// Conditions tried on `exports` entries, in order
const CONDITIONS: &[&str] = &["require", "node", "default", "import"];

/// Node.js-style lookup of vendor modules in `node_modules`, walking up from the root
pub struct NodeModulesVendorResolver;

impl NodeModulesVendorResolver {
    pub fn new() -> Self {
        Self
    }

    /// `@scope/pkg/sub/path` → (`@scope/pkg`, `sub/path`)
    fn parse_package_specifier(specifier: &str) -> (String, Option<String>) {
        let segments = if specifier.starts_with('@') { 2 } else { 1 };
        let mut parts = specifier.splitn(segments + 1, '/');
        let name: Vec<&str> = parts.by_ref().take(segments).collect();
        let subpath = parts.next().filter(|rest| !rest.is_empty()).map(str::to_string);
        (name.join("/"), subpath)
    }

    async fn resolve_in(&self, node_modules: &Path, specifier: &str) -> Option<PathBuf> {
        let (package, subpath) = Self::parse_package_specifier(specifier);
        let package_dir = node_modules.join(&package);
        if !is_dir(&package_dir).await {
            return None;
        }

        let package_json = read_package_json(&package_dir).await;

        if let Some(exports) = package_json.as_ref().and_then(|pkg| pkg.get("exports")) {
            let key = match &subpath {
                Some(subpath) => format!("./{}", subpath),
                None => ".".to_string(),
            };
            if let Some(target) = exports.get(&key).and_then(export_target) {
                let resolved = package_dir.join(target.trim_start_matches("./"));
                if is_file(&resolved).await {
                    return Some(resolved);
                }
            }
        }

        match subpath {
            Some(subpath) => self.resolve_file_or_directory(&package_dir.join(subpath)).await,
            None => {
                if let Some(main) = package_json
                    .as_ref()
                    .and_then(|pkg| pkg.get("main"))
                    .and_then(Value::as_str)
                {
                    if let Some(resolved) = self.resolve_file_or_directory(&package_dir.join(main)).await {
                        return Some(resolved);
                    }
                }
                self.resolve_file_or_directory(&package_dir.join("index")).await
            }
        }
    }

    async fn resolve_file_or_directory(&self, base: &Path) -> Option<PathBuf> {
        if is_file(base).await {
            return Some(base.to_path_buf());
        }

        for ext in EXTENSIONS {
            let candidate = PathBuf::from(format!("{}.{}", base.display(), ext));
            if is_file(&candidate).await {
                return Some(candidate);
            }
        }

        if is_dir(base).await {
            for ext in EXTENSIONS {
                let candidate = base.join(format!("index.{}", ext));
                if is_file(&candidate).await {
                    return Some(candidate);
                }
            }
        }

        None
    }
}

impl Default for NodeModulesVendorResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VendorResolver for NodeModulesVendorResolver {
    async fn resolve(&self, specifier: &str, root: &Path) -> Result<PathBuf> {
        for dir in root.ancestors() {
            let node_modules = dir.join("node_modules");
            if !is_dir(&node_modules).await {
                continue;
            }
            if let Some(resolved) = self.resolve_in(&node_modules, specifier).await {
                Logger::debug(&format!("🔗 {} → {}", specifier, resolved.display()));
                return Ok(resolved);
            }
        }

        Err(DualBuildError::Resolve(format!(
            "{} from {}",
            specifier,
            root.display()
        )))
    }
}

/// `"./x.js"` or `{ "require": "./x.cjs", "default": "./x.js" }`, nested conditions allowed
fn export_target(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(target) => Some(target.as_str()),
        Value::Object(conditions) => CONDITIONS
            .iter()
            .find_map(|condition| conditions.get(*condition).and_then(export_target)),
        _ => None,
    }
}

async fn read_package_json(package_dir: &Path) -> Option<Value> {
    let content = fs::read_to_string(package_dir.join("package.json")).await.ok()?;
    serde_json::from_str(&content).ok()
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|meta| meta.is_file()).unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|meta| meta.is_dir()).unwrap_or(false)
}
