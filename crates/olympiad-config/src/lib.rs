//! Configuration system for the Olympiad portal gate.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[gate]` and `[identity]` sections
//! - Config file layering (user config dir + project-local overrides)
//! - Identity API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{IDENTITY_KEY_ENV, ResolvedSecret, SecretSource, resolve_identity_key};
pub use types::*;
