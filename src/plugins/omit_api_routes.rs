// API route modules (`*+api.ts` / `*+api.tsx`) must never reach a bundle.
// The bundler empties every module whose id matches the descriptor's `pattern`.

use crate::core::plugin::{Enforce, Plugin};
use serde_json::{json, Value};

/// Module ids treated as API routes
pub const API_ROUTE_PATTERN: &str = r"\+api\.tsx?$";

/// Compiles every API route module to an empty module
#[derive(Debug, Clone, Default)]
pub struct OmitApiRoutesPlugin;

impl OmitApiRoutesPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for OmitApiRoutesPlugin {
    fn name(&self) -> &str {
        "omit-api-routes"
    }

    fn enforce(&self) -> Option<Enforce> {
        Some(Enforce::Pre)
    }

    fn descriptor(&self) -> Value {
        json!({
            "name": self.name(),
            "enforce": "pre",
            "pattern": API_ROUTE_PATTERN,
        })
    }
}
