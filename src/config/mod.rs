//! Configuration merge system
//!
//! Three layers, later wins:
//! 1. Built-in defaults
//! 2. TOML file (`confpatch.toml` in the document root, or `--config`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::EngineConfig;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, CONFIG_FILE_NAME};
pub use merge::{deep_merge, merge_layers};
