use crate::core::models::{
    BuildOptions, BuildSettings, DepsSettings, ServerBuildOption, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_VENDOR_PACKAGE,
};
use crate::utils::{DualBuildError, Logger, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "dualbuild.config.json";

/// `build` section of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSection {
    /// `false` for static-only sites, or `{ "outputFormat": "cjs" }`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerBuildOption>,

    /// Emit a bundle-size report for the client build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyze: Option<bool>,
}

/// Configuration file format (dualbuild.config.json). Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DualBuildConfig {
    /// Project root (CLI only, never read from the file)
    #[serde(skip)]
    pub root: Option<PathBuf>,

    /// Dev/preview server host (default: "0.0.0.0")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Dev/preview server port (default: 8081)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,

    /// Dependency pre-bundling include/exclude lists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps: Option<DepsSettings>,

    /// Package providing the pinned runtime modules (default: "@dualbuild/vendor")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_package: Option<String>,
}

/// Flags given on the command line; they beat the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub analyze: Option<bool>,
    pub server: Option<bool>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load dualbuild.config.json from the project root if it exists
    pub async fn load_from_file(root: &Path) -> Result<Option<DualBuildConfig>> {
        let config_path = root.join(CONFIG_FILE_NAME);

        if !tokio::fs::try_exists(&config_path).await.unwrap_or(false) {
            Logger::debug(&format!("No {} found, using defaults", CONFIG_FILE_NAME));
            return Ok(None);
        }

        Logger::debug(&format!("Loading config from {}", config_path.display()));

        let content = tokio::fs::read_to_string(&config_path).await?;
        let config: DualBuildConfig = serde_json::from_str(&content).map_err(|e| {
            DualBuildError::config(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))
        })?;

        Ok(Some(config))
    }

    /// Overlay CLI flags onto the file config (CLI > config file > defaults)
    pub fn merge_with_cli(
        file_config: Option<DualBuildConfig>,
        root: PathBuf,
        overrides: &CliOverrides,
    ) -> DualBuildConfig {
        let mut config = file_config.unwrap_or_default();
        config.root = Some(root);

        let mut build = config.build.take().unwrap_or_default();
        if let Some(analyze) = overrides.analyze {
            build.analyze = Some(analyze);
        }
        if overrides.server == Some(false) {
            build.server = Some(ServerBuildOption::Toggle(false));
        }
        config.build = Some(build);

        config
    }

    /// Fill defaults and canonicalize the root
    pub async fn resolve(config: DualBuildConfig) -> Result<BuildOptions> {
        let root = config.root.unwrap_or_else(|| PathBuf::from("."));
        let root = tokio::fs::canonicalize(&root).await.map_err(|e| {
            DualBuildError::config(format!("Invalid root {}: {}", root.display(), e))
        })?;

        let build = config.build.unwrap_or_default();

        Ok(BuildOptions {
            root,
            host: config.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: config.port.unwrap_or(DEFAULT_PORT),
            build: BuildSettings {
                server: build.server.unwrap_or_default(),
                analyze: build.analyze.unwrap_or(false),
            },
            deps: config.deps.unwrap_or_default(),
            vendor_package: config
                .vendor_package
                .unwrap_or_else(|| DEFAULT_VENDOR_PACKAGE.to_string()),
        })
    }

    /// Example config file
    pub fn generate_example() -> String {
        let example = DualBuildConfig {
            root: None,
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            build: Some(BuildSection {
                server: Some(ServerBuildOption::default()),
                analyze: Some(false),
            }),
            deps: Some(DepsSettings::default()),
            vendor_package: Some(DEFAULT_VENDOR_PACKAGE.to_string()),
        };
        serde_json::to_string_pretty(&example).unwrap_or_default()
    }
}
