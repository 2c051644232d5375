//! Configuration system for the Satchel session engine.
//!
//! Provides TOML-based configuration with:
//! - `[session]` store settings, embedding [`satchel_session::SessionConfig`]
//! - `[storage]` backend selection (memory or file)
//! - `[logging]` output settings
//! - Config file layering (user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    save_config, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
