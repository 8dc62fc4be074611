//! Configuration loading and data directory resolution.
//!
//! Config files: `switchyard.toml`, `switchyard.yaml`, or `switchyard.json`
//! Searched in `./` then `~/.config/switchyard/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{
        clear_data_dir, config_dir, data_dir, discover_and_load, load_config, set_data_dir,
    },
    schema::{GateConfig, SwitchyardConfig},
};
