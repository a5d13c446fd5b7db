//! Bridge settings (config.toml)
//!
//! Every section and field is optional; accessors fall back to built-in defaults.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable the host runtime uses to publish its function table
pub const DEFAULT_CALLIN_VARIABLE: &str = "GTM_CALLIN_START";

/// Bridge configuration from config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// PCRE2 library location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryConfig>,

    /// Host runtime integration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostConfig>,

    /// Diagnostic output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticsConfig>,
}

/// PCRE2 library location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Exact path of the shared library; skips searching when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Extra directories searched before the dynamic linker's defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_paths: Option<Vec<PathBuf>>,
}

/// Host runtime integration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Variable holding the decimal address of the host function table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callin_variable: Option<String>,
}

/// Diagnostic output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Emit diagnostics at all (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Colour mode (default: auto)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorSetting>,

    /// Rendering (default: human)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DiagnosticFormat>,
}

/// When to colour diagnostic output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    #[default]
    Auto,
    Always,
    Never,
}

/// How diagnostics are rendered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for ColorSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(ConfigError::InvalidValue {
                field: "diagnostics.color".to_string(),
                reason: format!("must be 'auto', 'always', or 'never', got '{}'", other),
            }),
        }
    }
}

impl FromStr for DiagnosticFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: "diagnostics.format".to_string(),
                reason: format!("must be 'human' or 'json', got '{}'", other),
            }),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration text; `origin` is only used for error messages
    pub fn parse(content: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: origin.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(host) = &self.host {
            if let Some(variable) = &host.callin_variable {
                if variable.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "host.callin_variable".to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
            }
        }

        if let Some(path) = self.library.as_ref().and_then(|l| l.path.as_ref()) {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "library.path".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Merge another config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &BridgeConfig) {
        if other.library.is_some() {
            self.library = other.library.clone();
        }
        if other.host.is_some() {
            self.host = other.host.clone();
        }
        if other.diagnostics.is_some() {
            self.diagnostics = other.diagnostics.clone();
        }
    }

    /// Explicit library path, if configured
    pub fn library_path(&self) -> Option<&Path> {
        self.library.as_ref().and_then(|l| l.path.as_deref())
    }

    /// Extra library search directories
    pub fn search_paths(&self) -> &[PathBuf] {
        self.library
            .as_ref()
            .and_then(|l| l.search_paths.as_deref())
            .unwrap_or(&[])
    }

    /// Name of the variable carrying the host function table address
    pub fn callin_variable(&self) -> &str {
        self.host
            .as_ref()
            .and_then(|h| h.callin_variable.as_deref())
            .unwrap_or(DEFAULT_CALLIN_VARIABLE)
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics
            .as_ref()
            .and_then(|d| d.enabled)
            .unwrap_or(true)
    }

    pub fn color(&self) -> ColorSetting {
        self.diagnostics
            .as_ref()
            .and_then(|d| d.color)
            .unwrap_or_default()
    }

    pub fn diagnostic_format(&self) -> DiagnosticFormat {
        self.diagnostics
            .as_ref()
            .and_then(|d| d.format)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(toml: &str) -> ConfigResult<BridgeConfig> {
        BridgeConfig::parse(toml, Path::new("config.toml"))
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.library_path(), None);
        assert!(config.search_paths().is_empty());
        assert_eq!(config.callin_variable(), "GTM_CALLIN_START");
        assert!(config.diagnostics_enabled());
        assert_eq!(config.color(), ColorSetting::Auto);
        assert_eq!(config.diagnostic_format(), DiagnosticFormat::Human);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[library]
path = "/opt/pcre2/lib/libpcre2-8.so.0"
search_paths = ["/opt/pcre2/lib", "/usr/local/lib"]

[host]
callin_variable = "ydb_callin_start"

[diagnostics]
enabled = false
color = "never"
format = "json"
"#;
        let config = parse(toml).unwrap();
        assert_eq!(
            config.library_path(),
            Some(Path::new("/opt/pcre2/lib/libpcre2-8.so.0"))
        );
        assert_eq!(config.search_paths().len(), 2);
        assert_eq!(config.callin_variable(), "ydb_callin_start");
        assert!(!config.diagnostics_enabled());
        assert_eq!(config.color(), ColorSetting::Never);
        assert_eq!(config.diagnostic_format(), DiagnosticFormat::Json);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse("[host]\nslot = 4\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError { .. }));
    }

    #[test]
    fn test_empty_callin_variable_rejected() {
        let err = parse("[host]\ncallin_variable = \"  \"\n").unwrap_err();
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "host.callin_variable"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_color_rejected() {
        let err = parse("[diagnostics]\ncolor = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError { .. }));
    }

    #[test]
    fn test_color_from_str() {
        assert_eq!("ALWAYS".parse::<ColorSetting>().unwrap(), ColorSetting::Always);
        assert!("blue".parse::<ColorSetting>().is_err());
        assert_eq!("json".parse::<DiagnosticFormat>().unwrap(), DiagnosticFormat::Json);
    }

    #[test]
    fn test_merge_prefers_other_sections() {
        let mut base = parse("[host]\ncallin_variable = \"A\"\n").unwrap();
        let other = parse("[diagnostics]\nenabled = false\n").unwrap();
        base.merge(&other);
        assert_eq!(base.callin_variable(), "A");
        assert!(!base.diagnostics_enabled());

        let host = parse("[host]\ncallin_variable = \"B\"\n").unwrap();
        base.merge(&host);
        assert_eq!(base.callin_variable(), "B");
    }
}
