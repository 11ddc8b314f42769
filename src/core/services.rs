use crate::core::config::{EffectiveConfig, PartialConfig};
use crate::core::interfaces::{
    Bundler, ConfigEnv, FileSystemService, NoopPatchHook, PatchHook, VendorResolver,
};
use crate::core::models::{
    BuildArgs, BuildOptions, BuildResult, BuildTarget, OutputChunk, ServerResolve, DEPS_CACHE_DIR,
    OUT_DIR,
};
use crate::core::target_config::TargetConfigBuilder;
use crate::infrastructure::{NodeModulesVendorResolver, TokioFileSystemService};
use crate::plugins::RemoveUnusedImportsPlugin;
use crate::utils::{
    ConfigLoader, DualBuildConfig, DualBuildError, EnvSnapshot, Logger, ModeContext, Result, Timer,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Runtime imports pinned to vendor modules in the server build, most specific first
pub const RUNTIME_ALIASES: &[(&str, &str)] = &[
    ("react/jsx-runtime", "react-jsx-19"),
    ("react", "react-19-prod"),
    ("react-dom/server.browser", "react-dom-server.browser-19"),
    ("react-dom/client", "react-dom-client-19"),
    ("react-dom", "react-dom-19"),
];

/// Both effective configs plus what went into them
#[derive(Debug)]
pub struct PreparedConfigs {
    pub client: EffectiveConfig,
    pub server: EffectiveConfig,
    pub server_resolve: ServerResolve,
    pub post_processor: Arc<RemoveUnusedImportsPlugin>,
}

/// Orchestrates a production run: config loading, patching, cleanup, then the
/// client and server builds.
pub struct DualBuildService {
    bundler: Arc<dyn Bundler>,
    fs_service: Arc<dyn FileSystemService>,
    vendor_resolver: Arc<dyn VendorResolver>,
    patch_hook: Arc<dyn PatchHook>,
    env: Option<EnvSnapshot>,
}

impl DualBuildService {
    pub fn new(bundler: Arc<dyn Bundler>) -> Self {
        Self {
            bundler,
            fs_service: Arc::new(TokioFileSystemService),
            vendor_resolver: Arc::new(NodeModulesVendorResolver::new()),
            patch_hook: Arc::new(NoopPatchHook),
            env: None,
        }
    }

    pub fn with_file_system(mut self, fs_service: Arc<dyn FileSystemService>) -> Self {
        self.fs_service = fs_service;
        self
    }

    pub fn with_vendor_resolver(mut self, vendor_resolver: Arc<dyn VendorResolver>) -> Self {
        self.vendor_resolver = vendor_resolver;
        self
    }

    pub fn with_patch_hook(mut self, patch_hook: Arc<dyn PatchHook>) -> Self {
        self.patch_hook = patch_hook;
        self
    }

    /// Use a fixed environment instead of capturing the process environment
    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    pub async fn build(&self, config: DualBuildConfig, args: BuildArgs) -> Result<BuildResult> {
        let started = Instant::now();

        // Mode is fixed before anything reads configuration.
        let mode = ModeContext::production();
        let env = self.snapshot(mode);

        let root_hint = config.root.clone().unwrap_or_else(|| ".".into());
        Logger::build_start(&root_hint.display().to_string(), mode.node_env());

        let (options, user_config) = {
            let _timer = Timer::start("Loading configuration");
            let config_env = ConfigEnv::build(root_hint, mode);
            futures::try_join!(
                ConfigLoader::resolve(config),
                self.bundler.load_user_config(&config_env)
            )?
        };

        if let Err(err) = self.patch_hook.apply(&options).await {
            Logger::patch_failed(&err);
        }

        self.clean(&options.root).await?;

        let prepared = self
            .prepare_configs(&options, &args, &env, user_config.unwrap_or_default())
            .await?;

        let client_output = if args.skips_client() {
            Logger::skipped(BuildTarget::Client, "generate step");
            None
        } else {
            Some(self.run_target(&prepared.client).await?)
        };

        let (server_output, client_manifest) = if options.build.server.is_enabled() {
            let output = self.run_target(&prepared.server).await?;
            let manifest_path = options.client_manifest_path();
            let manifest = self
                .fs_service
                .read_json(&manifest_path)
                .await
                .map_err(|err| DualBuildError::manifest(manifest_path, err))?;
            (Some(output), Some(manifest))
        } else {
            Logger::skipped(BuildTarget::Server, "build.server is false");
            (None, None)
        };

        Logger::build_complete(
            client_output.as_ref().map(Vec::len),
            server_output.as_ref().map(Vec::len),
            started.elapsed(),
        );

        Ok(BuildResult {
            options,
            build_args: args,
            client_output,
            server_output,
            remove_unused_imports: prepared.post_processor,
            server_resolve: prepared.server_resolve,
            client_config: prepared.client,
            server_config: prepared.server,
            client_manifest,
        })
    }

    /// Resolve options and assemble both configs without touching the workspace
    pub async fn inspect(&self, config: DualBuildConfig, args: &BuildArgs) -> Result<PreparedConfigs> {
        let mode = ModeContext::production();
        let env = self.snapshot(mode);
        let config_env = ConfigEnv::build(config.root.clone().unwrap_or_else(|| ".".into()), mode);

        let (options, user_config) = futures::try_join!(
            ConfigLoader::resolve(config),
            self.bundler.load_user_config(&config_env)
        )?;

        self.prepare_configs(&options, args, &env, user_config.unwrap_or_default())
            .await
    }

    fn snapshot(&self, mode: ModeContext) -> EnvSnapshot {
        self.env
            .clone()
            .unwrap_or_else(EnvSnapshot::capture)
            .with_mode(mode)
    }

    async fn prepare_configs(
        &self,
        options: &BuildOptions,
        args: &BuildArgs,
        env: &EnvSnapshot,
        user_config: PartialConfig,
    ) -> Result<PreparedConfigs> {
        // Static-only sites never load the vendor package.
        let server_resolve = if options.build.server.is_enabled() {
            self.resolve_runtime_aliases(options).await?
        } else {
            ServerResolve::default()
        };

        let builder = TargetConfigBuilder::new(options, args, env, &server_resolve);
        let base = builder.base_config();
        let client = builder.build(BuildTarget::Client, &base, &user_config);
        let server = builder.build(BuildTarget::Server, &base, &user_config);
        let post_processor = builder.post_processor();

        Ok(PreparedConfigs {
            client,
            server,
            server_resolve,
            post_processor,
        })
    }

    async fn resolve_runtime_aliases(
        &self,
        options: &BuildOptions,
    ) -> Result<ServerResolve> {
        let mut alias = Vec::with_capacity(RUNTIME_ALIASES.len());
        for (specifier, vendor_module) in RUNTIME_ALIASES {
            let vendor_specifier = format!("{}/{}", options.vendor_package, vendor_module);
            let resolved = self
                .vendor_resolver
                .resolve(&vendor_specifier, &options.root)
                .await?;
            alias.push((specifier.to_string(), resolved));
        }
        Ok(ServerResolve { alias })
    }

    /// Incremental output is never trusted: both directories go on every run.
    async fn clean(&self, root: &Path) -> Result<()> {
        let _timer = Timer::start("Cleaning");
        futures::try_join!(
            self.remove_if_exists(root, OUT_DIR),
            self.remove_if_exists(root, DEPS_CACHE_DIR)
        )?;
        Ok(())
    }

    async fn remove_if_exists(&self, root: &Path, relative: &str) -> Result<()> {
        let path = root.join(relative);
        if self.fs_service.exists(&path).await {
            self.fs_service.remove_dir_all(&path).await?;
            Logger::cleaned(relative);
        }
        Ok(())
    }

    async fn run_target(&self, config: &EffectiveConfig) -> Result<Vec<OutputChunk>> {
        Logger::phase(config.target());
        let _timer = Timer::start(&format!("{} build", config.target()));
        let output = self.bundler.build(config).await?;
        Ok(output.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::BundleOutput;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct StubBundler;

    #[async_trait]
    impl Bundler for StubBundler {
        async fn load_user_config(&self, _env: &ConfigEnv) -> Result<Option<PartialConfig>> {
            Ok(None)
        }

        async fn build(&self, _config: &EffectiveConfig) -> Result<BundleOutput> {
            Ok(BundleOutput::default())
        }
    }

    struct FlatVendorResolver;

    #[async_trait]
    impl VendorResolver for FlatVendorResolver {
        async fn resolve(&self, specifier: &str, root: &Path) -> Result<PathBuf> {
            Ok(root.join("node_modules").join(specifier))
        }
    }

    fn service() -> DualBuildService {
        DualBuildService::new(Arc::new(StubBundler))
            .with_vendor_resolver(Arc::new(FlatVendorResolver))
            .with_env(EnvSnapshot::default())
    }

    #[tokio::test]
    async fn test_runtime_aliases_keep_order_and_vendor_prefix() {
        let mut options = BuildOptions::with_root("/project");
        options.vendor_package = "@acme/vendor".to_string();

        let resolve = service().resolve_runtime_aliases(&options).await.unwrap();

        let specifiers: Vec<&str> = resolve.alias.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(
            specifiers,
            vec![
                "react/jsx-runtime",
                "react",
                "react-dom/server.browser",
                "react-dom/client",
                "react-dom"
            ]
        );
        assert_eq!(
            resolve.get("react"),
            Some(Path::new("/project/node_modules/@acme/vendor/react-19-prod"))
        );
    }

    #[tokio::test]
    async fn test_clean_removes_output_and_cache() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("dist/client")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("node_modules/.vite/deps")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("node_modules/react")).unwrap();

        service().clean(temp_dir.path()).await.unwrap();

        assert!(!temp_dir.path().join("dist").exists());
        assert!(!temp_dir.path().join("node_modules/.vite").exists());
        assert!(temp_dir.path().join("node_modules/react").exists());
    }

    #[tokio::test]
    async fn test_clean_on_fresh_workspace() {
        let temp_dir = tempfile::tempdir().unwrap();
        service().clean(temp_dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_inspect_builds_both_configs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = DualBuildConfig {
            root: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let prepared = service().inspect(config, &BuildArgs::default()).await.unwrap();

        assert_eq!(prepared.client.target(), BuildTarget::Client);
        assert_eq!(prepared.server.target(), BuildTarget::Server);
        assert_eq!(prepared.server_resolve.alias.len(), RUNTIME_ALIASES.len());
        assert!(!temp_dir.path().join("dist").exists());
    }
}
