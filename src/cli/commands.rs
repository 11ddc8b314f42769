use crate::core::models::{
    BuildArgs, BuildTarget, CLIENT_MANIFEST_PATH, CLIENT_OUT_DIR, DEPS_CACHE_DIR, ENTRY_MODULE,
    GENERATE_STEP, SERVER_OUT_DIR,
};
use crate::core::services::{DualBuildService, PreparedConfigs};
use crate::infrastructure::ProcessBundler;
use crate::utils::{
    BuildUI, CliOverrides, ConfigLoader, DualBuildConfig, EnvSnapshot, Logger, ModeContext,
    Result, CONFIG_FILE_NAME, DISABLE_PROD_OPTIMIZATION_VAR,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_BUNDLER: &str = "dualbuild-bundler";

#[derive(Parser)]
#[command(name = "dualbuild")]
#[command(version)]
#[command(about = "dualbuild - client + SSR production builds on top of an external bundler")]
pub struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the client and server bundles for production
    Build {
        /// Root directory
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Build step; "generate" skips the client build
        #[arg(long)]
        step: Option<String>,
        /// Emit a bundle-size report for the client build
        #[arg(long)]
        analyze: bool,
        /// Disable minification and tree shaking of the client build
        #[arg(long)]
        no_optimize: bool,
        /// Skip the server build (static-only site)
        #[arg(long)]
        no_server: bool,
        /// Bundler command line
        #[arg(long, default_value = DEFAULT_BUNDLER)]
        bundler: String,
        /// Also write both effective configs to this file
        #[arg(long)]
        config_out: Option<PathBuf>,
    },
    /// Print the effective configs without cleaning or building
    Inspect {
        /// Root directory
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Only print one target
        #[arg(short, long, value_enum)]
        target: Option<TargetArg>,
        /// Bundler command line
        #[arg(long, default_value = DEFAULT_BUNDLER)]
        bundler: String,
    },
    /// Show version and output layout
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    Client,
    Server,
}

impl From<TargetArg> for BuildTarget {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Client => BuildTarget::Client,
            TargetArg::Server => BuildTarget::Server,
        }
    }
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> Result<()> {
        let cli = Cli::parse();

        Logger::init(cli.verbose);

        match cli.command {
            Commands::Build {
                root,
                step,
                analyze,
                no_optimize,
                no_server,
                bundler,
                config_out,
            } => {
                let overrides = CliOverrides {
                    analyze: analyze.then_some(true),
                    server: no_server.then_some(false),
                };
                let args = BuildArgs { step, analyze };
                self.handle_build_command(&root, &bundler, args, overrides, no_optimize, config_out)
                    .await
            }
            Commands::Inspect {
                root,
                target,
                bundler,
            } => self.handle_inspect_command(&root, &bundler, target).await,
            Commands::Info => self.handle_info_command().await,
        }
    }

    async fn handle_build_command(
        &self,
        root: &str,
        bundler: &str,
        args: BuildArgs,
        overrides: CliOverrides,
        no_optimize: bool,
        config_out: Option<PathBuf>,
    ) -> Result<()> {
        let ui = BuildUI::new();
        ui.show_banner();

        let config = load_config(root, &overrides).await?;

        let mut env = EnvSnapshot::capture();
        if no_optimize {
            env = env.with_var(DISABLE_PROD_OPTIMIZATION_VAR, "1");
        }

        let bundler = ProcessBundler::from_command_line(bundler, ModeContext::production())?;
        let service = DualBuildService::new(Arc::new(bundler)).with_env(env);

        let result = service.build(config, args).await?;

        if let Some(path) = config_out {
            let configs = json!({
                "client": result.client_config.to_value(),
                "server": result.server_config.to_value(),
            });
            write_json(&path, &configs).await?;
            Logger::info(&format!("📝 Effective configs written to {}", path.display()));
        }

        ui.show_completion(&result);
        Ok(())
    }

    async fn handle_inspect_command(
        &self,
        root: &str,
        bundler: &str,
        target: Option<TargetArg>,
    ) -> Result<()> {
        let config = load_config(root, &CliOverrides::default()).await?;
        let bundler = ProcessBundler::from_command_line(bundler, ModeContext::production())?;
        let service = DualBuildService::new(Arc::new(bundler));

        let prepared = service.inspect(config, &BuildArgs::default()).await?;
        let output = render_configs(&prepared, target.map(BuildTarget::from));

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    async fn handle_info_command(&self) -> Result<()> {
        tracing::info!("🔨 dualbuild v{}", env!("CARGO_PKG_VERSION"));
        tracing::info!("══════════════════════════════════════");
        tracing::info!("⚡ Client + SSR production builds on top of an external bundler");
        tracing::info!("");
        tracing::info!("📐 Layout:");
        tracing::info!("  • Entry module:     {}", ENTRY_MODULE);
        tracing::info!("  • Client output:    {}", CLIENT_OUT_DIR);
        tracing::info!("  • Server output:    {}", SERVER_OUT_DIR);
        tracing::info!("  • Client manifest:  {}", CLIENT_MANIFEST_PATH);
        tracing::info!("  • Deps cache:       {}", DEPS_CACHE_DIR);
        tracing::info!("");
        tracing::info!("⚙️  Configuration:");
        tracing::info!("  • {} at the project root", CONFIG_FILE_NAME);
        tracing::info!("  • --step {} skips the client build", GENERATE_STEP);
        tracing::info!(
            "  • {}=1 disables client minification and tree shaking",
            DISABLE_PROD_OPTIMIZATION_VAR
        );
        tracing::info!("");
        tracing::info!("📄 Example {}:", CONFIG_FILE_NAME);
        for line in ConfigLoader::generate_example().lines() {
            tracing::info!("  {}", line);
        }

        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}

async fn load_config(root: &str, overrides: &CliOverrides) -> Result<DualBuildConfig> {
    let root = PathBuf::from(root);
    let file_config = ConfigLoader::load_from_file(&root).await?;
    Ok(ConfigLoader::merge_with_cli(file_config, root, overrides))
}

/// `{ "client": ..., "server": ... }`, or just the one requested target
pub fn render_configs(prepared: &PreparedConfigs, target: Option<BuildTarget>) -> Value {
    match target {
        Some(BuildTarget::Client) => prepared.client.to_value(),
        Some(BuildTarget::Server) => prepared.server.to_value(),
        None => json!({
            "client": prepared.client.to_value(),
            "server": prepared.server.to_value(),
        }),
    }
}

async fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_string_pretty(value)?).await?;
    Ok(())
}
