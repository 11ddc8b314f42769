// Bundle-size report for the client build. The visualization itself is done by the
// bundler-side analyzer; this only configures it.

use crate::core::plugin::Plugin;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct BundleAnalyzerPlugin {
    analyzer_mode: String,
    file_name: String,
}

impl BundleAnalyzerPlugin {
    /// Static HTML report written next to the client output directory
    pub fn static_report() -> Self {
        Self {
            analyzer_mode: "static".to_string(),
            file_name: "../report".to_string(),
        }
    }
}

impl Plugin for BundleAnalyzerPlugin {
    fn name(&self) -> &str {
        "bundle-analyzer"
    }

    fn descriptor(&self) -> Value {
        json!({
            "name": self.name(),
            "analyzerMode": self.analyzer_mode,
            "fileName": self.file_name,
        })
    }
}
