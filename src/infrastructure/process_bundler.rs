// Drives an external bundler executable over a small JSON protocol:
//
//   <command> load-config --command build --mode <mode> --root <root>
//       → stdout: config object or null
//   <command> build <config.json>
//       → stdout: { "output": [...] }
//
// Plugins reach the bundler as descriptors. Module-level hooks are the bundler's
// job: `{ "name": "omit-api-routes", "enforce": "pre", "pattern": <regex> }` means
// every module whose id matches `pattern` compiles to an empty module.
// Chunk hooks of the config's output plugins run here, on the files the bundler wrote.

use crate::core::config::{EffectiveConfig, PartialConfig};
use crate::core::interfaces::{Bundler, ConfigEnv};
use crate::core::models::{BundleOutput, ChunkKind};
use crate::core::plugin::PluginManager;
use crate::utils::{DualBuildError, Logger, ModeContext, Result, Timer};
use async_trait::async_trait;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

pub struct ProcessBundler {
    program: String,
    args: Vec<String>,
    mode: ModeContext,
}

impl ProcessBundler {
    pub fn new(program: impl Into<String>, args: Vec<String>, mode: ModeContext) -> Self {
        Self {
            program: program.into(),
            args,
            mode,
        }
    }

    /// Split a command line such as `node ./scripts/bundle.mjs` on whitespace
    pub fn from_command_line(command_line: &str, mode: ModeContext) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| DualBuildError::config("bundler command is empty"))?;
        Ok(Self::new(program, parts.collect(), mode))
    }

    fn command(&self, cwd: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(cwd)
            .env("NODE_ENV", self.mode.node_env())
            .kill_on_drop(true);
        command
    }

    async fn run(&self, mut command: Command) -> Result<Output> {
        command.output().await.map_err(|err| {
            DualBuildError::Process(format!("failed to start `{}`: {}", self.program, err))
        })
    }

    /// Apply `render_chunk` hooks to emitted code chunks and rewrite changed files
    async fn post_process(&self, config: &EffectiveConfig, root: &Path, output: &mut BundleOutput) -> Result<()> {
        if config.output_plugins().is_empty() {
            return Ok(());
        }

        let _timer = Timer::start("chunk post-processing");
        let manager = PluginManager::from_plugins(config.output_plugins());
        let out_dir = root.join(config.out_dir().unwrap_or("dist"));

        for chunk in output.output.iter_mut() {
            if chunk.kind != ChunkKind::Chunk {
                continue;
            }
            let Some(code) = chunk.code.clone() else {
                continue;
            };

            let rendered = manager.render_chunk(code.clone(), chunk)?;
            if rendered != code {
                tokio::fs::write(out_dir.join(&chunk.file_name), &rendered).await?;
                Logger::debug(&format!("✂️  Rewrote {}", chunk.file_name));
                chunk.code = Some(rendered);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Bundler for ProcessBundler {
    async fn load_user_config(&self, env: &ConfigEnv) -> Result<Option<PartialConfig>> {
        let mut command = self.command(&env.root);
        command
            .arg("load-config")
            .arg("--command")
            .arg(env.command)
            .arg("--mode")
            .arg(env.mode.config_mode())
            .arg("--root")
            .arg(&env.root);

        let output = self.run(command).await?;
        if !output.status.success() {
            return Err(DualBuildError::config(format!(
                "loading bundler config failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let value: Value = serde_json::from_slice(&output.stdout)?;
        if value.is_null() {
            Logger::debug("No bundler config file found");
            return Ok(None);
        }
        PartialConfig::from_value(value).map(Some)
    }

    async fn build(&self, config: &EffectiveConfig) -> Result<BundleOutput> {
        let target = config.target();
        let root = config.root().unwrap_or_else(|| PathBuf::from("."));

        let mut config_file = tempfile::Builder::new()
            .prefix(&format!("dualbuild-{}-", target))
            .suffix(".json")
            .tempfile()?;
        serde_json::to_writer_pretty(&mut config_file, &config.to_value())?;
        config_file.flush()?;

        let mut command = self.command(&root);
        command.arg("build").arg(config_file.path());

        let output = self.run(command).await?;
        if !output.status.success() {
            return Err(DualBuildError::bundler_with_diagnostics(
                target,
                format!("bundler exited with {}", output.status),
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        let mut bundle: BundleOutput = serde_json::from_slice(&output.stdout).map_err(|err| {
            DualBuildError::bundler(target, format!("unreadable bundler output: {}", err))
        })?;

        self.post_process(config, &root, &mut bundle).await?;
        Ok(bundle)
    }
}
