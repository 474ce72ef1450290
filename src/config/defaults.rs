//! Built-in engine defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Engine and host settings after all layers are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound on `MM_PATCH_LOOP` reapplications per document (default: 1000)
    pub max_patch_loop_iterations: usize,

    /// Identifiers added to the known set on top of discovered ones
    pub extra_identifiers: Vec<String>,

    /// Glob patterns selecting document files (default: `**/*.cfg`)
    pub include: Vec<String>,

    /// Directory names skipped while walking
    pub exclude_dirs: Vec<String>,

    /// Add each collection directory name to the known set (default: true)
    pub include_directory_identifiers: bool,

    /// Let `:FOR[x]` patches register `x` as known (default: true)
    pub register_for_identifiers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_patch_loop_iterations: 1000,
            extra_identifiers: Vec::new(),
            include: vec!["**/*.cfg".to_string()],
            exclude_dirs: Vec::new(),
            include_directory_identifiers: true,
            register_for_identifiers: true,
        }
    }
}

impl EngineConfig {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "max_patch_loop_iterations": self.max_patch_loop_iterations,
            "extra_identifiers": self.extra_identifiers,
            "include": self.include,
            "exclude_dirs": self.exclude_dirs,
            "include_directory_identifiers": self.include_directory_identifiers,
            "register_for_identifiers": self.register_for_identifiers,
        })
    }
}
