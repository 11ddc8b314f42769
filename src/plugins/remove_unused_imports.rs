// Strips side-effect-only imports left dead in server chunks once everything is bundled in.

use crate::core::models::OutputChunk;
use crate::core::plugin::{Plugin, RenderedChunk};
use crate::utils::Result;
use once_cell::sync::Lazy;
use regex::Regex;

// `import "x";` / `import 'x';` followed by a newline. Textual, so it also matches
// inside string literals and comments.
static SIDE_EFFECT_IMPORT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+['"][^'"]+['"];\n"#).unwrap());

/// Output transform for server chunks
#[derive(Debug, Default)]
pub struct RemoveUnusedImportsPlugin;

impl RemoveUnusedImportsPlugin {
    pub fn new() -> Self {
        Self
    }

    /// Removes matches until none remain, so removal cannot splice a new match together.
    pub fn strip(&self, code: &str) -> String {
        let mut current = code.to_string();
        while SIDE_EFFECT_IMPORT_REGEX.is_match(&current) {
            current = SIDE_EFFECT_IMPORT_REGEX.replace_all(&current, "").into_owned();
        }
        current
    }
}

impl Plugin for RemoveUnusedImportsPlugin {
    fn name(&self) -> &str {
        "remove-unused-imports"
    }

    fn render_chunk(&self, code: &str, _chunk: &OutputChunk) -> Result<Option<RenderedChunk>> {
        Ok(Some(RenderedChunk {
            code: self.strip(code),
            map: None,
        }))
    }
}
