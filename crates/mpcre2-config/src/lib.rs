//! mpcre2 bridge configuration
//!
//! Provides configuration for the PCRE2 call-in bridge:
//! - Where to find the PCRE2 shared library
//! - Which environment variable carries the host function table address
//! - How diagnostics are rendered
//!
//! # Sources
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults
//! 2. Config file (`$MPCRE2_CONFIG`, else `<config dir>/mpcre2/config.toml`)
//! 3. Environment variables (MPCRE2_*)
//!
//! # Example
//!
//! ```no_run
//! use mpcre2_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load().unwrap();
//! println!("table address read from {}", config.callin_variable());
//! ```

pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Only for a file named explicitly, by `ConfigLoader::with_path` or `MPCRE2_CONFIG`
    #[error("mpcre2 config {0} does not exist")]
    NotFound(PathBuf),

    #[error("cannot read mpcre2 config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{file} is not valid TOML: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    /// `field` is a dotted config key or an environment variable name
    #[error("bad {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::ConfigLoader;
pub use settings::{
    BridgeConfig, ColorSetting, DiagnosticFormat, DiagnosticsConfig, HostConfig, LibraryConfig,
    DEFAULT_CALLIN_VARIABLE,
};
