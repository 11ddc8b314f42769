use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::core::models::BuildTarget;

pub struct Logger;

impl Logger {
    /// Install the fmt subscriber. `RUST_LOG` wins over the default filter.
    pub fn init(verbose: bool) {
        let default_filter = if verbose { "dualbuild=debug" } else { "dualbuild=info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

    pub fn build_start(root: &str, mode: &str) {
        info!("🔨 dualbuild - Production Build");
        info!("═══════════════════════════════════════");
        info!("📁 Root: {}", root);
        info!("🎯 Mode: {}", mode);
    }

    pub fn phase(target: BuildTarget) {
        info!("");
        info!("🔨 build {}", target);
        info!("");
    }

    pub fn skipped(target: BuildTarget, reason: &str) {
        info!("⏭️  Skipping {} build ({})", target, reason);
    }

    pub fn cleaned(path: &str) {
        debug!("🧹 Removed {}", path);
    }

    pub fn patch_failed(err: &dyn std::fmt::Display) {
        error!("🥺 error applying built-in patches: {}", err);
    }

    pub fn build_complete(client_chunks: Option<usize>, server_chunks: Option<usize>, build_time: Duration) {
        info!("");
        info!("📊 Build Statistics:");
        match client_chunks {
            Some(count) => info!("  • Client files emitted: {}", count),
            None => info!("  • Client build: skipped"),
        }
        match server_chunks {
            Some(count) => info!("  • Server files emitted: {}", count),
            None => info!("  • Server build: skipped"),
        }
        info!("  • Build time: {:.2?}", build_time);
        info!("");
        info!("✅ Build completed successfully!");
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
