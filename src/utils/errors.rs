use std::path::PathBuf;
use thiserror::Error;

use crate::core::models::BuildTarget;

#[derive(Error, Debug)]
pub enum DualBuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{target} build failed: {message}")]
    Bundler {
        target: BuildTarget,
        message: String,
        diagnostics: Option<String>,
    },

    #[error("Failed to read client manifest at {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: Box<DualBuildError>,
    },

    #[error("Could not resolve {0}")]
    Resolve(String),

    #[error("Bundler process error: {0}")]
    Process(String),

    #[error("{0}")]
    Other(String),
}

impl DualBuildError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a bundler failure without a diagnostic payload
    pub fn bundler(target: BuildTarget, message: impl Into<String>) -> Self {
        Self::Bundler {
            target,
            message: message.into(),
            diagnostics: None,
        }
    }

    /// Create a bundler failure carrying the bundler's own diagnostic output
    pub fn bundler_with_diagnostics(
        target: BuildTarget,
        message: impl Into<String>,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self::Bundler {
            target,
            message: message.into(),
            diagnostics: Some(diagnostics.into()),
        }
    }

    pub fn manifest(path: PathBuf, source: DualBuildError) -> Self {
        Self::Manifest {
            path,
            source: Box::new(source),
        }
    }

    /// Format error with the bundler's diagnostics, if any
    pub fn format_detailed(&self) -> String {
        match self {
            DualBuildError::Bundler {
                target,
                message,
                diagnostics,
            } => {
                let mut output = format!("❌ {} build failed: {}", target, message);
                if let Some(diagnostics) = diagnostics {
                    output.push_str("\n📝 Bundler output:\n");
                    for line in diagnostics.lines() {
                        output.push_str(&format!("  │ {}\n", line));
                    }
                }
                output
            }
            DualBuildError::Manifest { path, source } => {
                format!(
                    "❌ Client manifest missing or unreadable\n📁 File: {}\n💡 {}",
                    path.display(),
                    source
                )
            }
            _ => format!("❌ {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DualBuildError>;

impl From<regex::Error> for DualBuildError {
    fn from(err: regex::Error) -> Self {
        DualBuildError::config(format!("Regex error: {}", err))
    }
}

impl From<anyhow::Error> for DualBuildError {
    fn from(err: anyhow::Error) -> Self {
        DualBuildError::Other(format!("{:#}", err))
    }
}
