//! Configuration loading
//!
//! Reads the optional config file and `ALMANAC_*` environment overrides into
//! [`almanac_domain::Config`].

pub mod loader;

pub use loader::{
    apply_env, display_timezone, load, load_from_env, load_from_file, probe_config_paths, validate,
};
