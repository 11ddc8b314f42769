use crate::core::models::{BuildResult, BuildTarget, OutputChunk, CLIENT_OUT_DIR, SERVER_OUT_DIR};
use colored::*;
use std::time::Instant;

/// Vite-style terminal summary of a finished build
pub struct BuildUI {
    start_time: Instant,
}

impl BuildUI {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn show_banner(&self) {
        println!(
            "\n  {} {}",
            "DUALBUILD".bright_cyan().bold(),
            concat!("v", env!("CARGO_PKG_VERSION")).bright_white()
        );
        println!();
    }

    pub fn show_completion(&self, result: &BuildResult) {
        if let Some(output) = &result.client_output {
            self.show_target(BuildTarget::Client, output);
        }
        if let Some(output) = &result.server_output {
            self.show_target(BuildTarget::Server, output);
        }

        let build_time = self.start_time.elapsed();
        println!();
        println!(
            "  {} built in {}",
            "✓".bright_green(),
            format!("{:.0}ms", build_time.as_secs_f64() * 1000.0)
                .bright_white()
                .bold()
        );
    }

    fn show_target(&self, target: BuildTarget, output: &[OutputChunk]) {
        let out_dir = match target {
            BuildTarget::Client => CLIENT_OUT_DIR,
            BuildTarget::Server => SERVER_OUT_DIR,
        };

        println!();
        println!("  {}", target.as_str().bright_white().bold());
        for chunk in output {
            println!(
                "  {} {} {}",
                format!("{}/", out_dir).bright_black(),
                chunk.file_name.bright_cyan(),
                format!("({})", format_size(chunk.byte_size())).bright_black()
            );
        }
    }
}

impl Default for BuildUI {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_size(bytes: usize) -> String {
    let size_kb = bytes as f64 / 1024.0;
    if size_kb < 1.0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} kB", size_kb)
    }
}
