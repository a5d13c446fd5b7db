//! Reading the config file and `MPCRE2_*` overrides

use crate::settings::{BridgeConfig, ColorSetting, DiagnosticFormat};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::PathBuf;

/// Variable naming an explicit config file
pub const CONFIG_PATH_VAR: &str = "MPCRE2_CONFIG";
/// Overrides `library.path`
pub const LIBRARY_VAR: &str = "MPCRE2_LIBRARY";
/// Overrides `host.callin_variable`
pub const CALLIN_VARIABLE_VAR: &str = "MPCRE2_CALLIN_VARIABLE";
/// `off`, `human` or `json`
pub const DIAGNOSTICS_VAR: &str = "MPCRE2_DIAGNOSTICS";
/// Overrides `diagnostics.color`
pub const COLOR_VAR: &str = "MPCRE2_COLOR";

/// Builds a `BridgeConfig` from defaults, then a file, then the environment
pub struct ConfigLoader {
    /// Explicit config file, bypassing discovery
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Load from a specific file instead of discovering one
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load the effective configuration
    ///
    /// An explicitly named file (constructor or `MPCRE2_CONFIG`) must exist.
    /// The per-user file is optional.
    pub fn load(&self) -> ConfigResult<BridgeConfig> {
        let mut config = BridgeConfig::default();

        if let Some(path) = self.explicit_path() {
            config.merge(&BridgeConfig::load_from_file(&path)?);
        } else if let Some(path) = Self::user_config_path() {
            if path.exists() {
                config.merge(&BridgeConfig::load_from_file(&path)?);
            }
        }

        self.apply_env_overrides(config)
    }

    fn explicit_path(&self) -> Option<PathBuf> {
        self.config_path
            .clone()
            .or_else(|| env::var_os(CONFIG_PATH_VAR).map(PathBuf::from))
    }

    /// Per-user config file (`<config dir>/mpcre2/config.toml`)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mpcre2").join("config.toml"))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, mut config: BridgeConfig) -> ConfigResult<BridgeConfig> {
        if let Some(path) = env::var_os(LIBRARY_VAR) {
            config.library.get_or_insert_with(Default::default).path = Some(PathBuf::from(path));
        }

        if let Ok(variable) = env::var(CALLIN_VARIABLE_VAR) {
            config
                .host
                .get_or_insert_with(Default::default)
                .callin_variable = Some(variable);
        }

        if let Ok(mode) = env::var(DIAGNOSTICS_VAR) {
            let diagnostics = config.diagnostics.get_or_insert_with(Default::default);
            match mode.to_lowercase().as_str() {
                "off" | "0" | "false" | "no" => diagnostics.enabled = Some(false),
                other => {
                    diagnostics.enabled = Some(true);
                    diagnostics.format = Some(other.parse::<DiagnosticFormat>().map_err(|_| {
                        ConfigError::InvalidValue {
                            field: DIAGNOSTICS_VAR.to_string(),
                            reason: format!("must be 'off', 'human', or 'json', got '{}'", mode),
                        }
                    })?);
                }
            }
        }

        if let Ok(color) = env::var(COLOR_VAR) {
            config.diagnostics.get_or_insert_with(Default::default).color =
                Some(color.parse::<ColorSetting>()?);
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
