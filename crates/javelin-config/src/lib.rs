//! Configuration for Javelin binaries.
//!
//! ```toml
//! [parser]
//! mode = "method"
//! max_depth = 256
//!
//! [logging]
//! level = "info"
//! json = false
//! stderr = true
//! ```

use std::path::{Path, PathBuf};

use javelin_syntax::ParseMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod logging;

pub use logging::init_tracing;

/// Environment variable naming a config file used when no path is given.
pub const JAVELIN_CONFIG_ENV_VAR: &str = "JAVELIN_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JavelinConfig {
    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    /// Default body handling for completion requests.
    #[serde(default)]
    pub mode: ParseMode,

    /// Nesting limit for statements and expressions.
    #[serde(default = "ParserConfig::default_max_depth")]
    pub max_depth: usize,
}

impl ParserConfig {
    fn default_max_depth() -> usize {
        256
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            mode: ParseMode::default(),
            max_depth: Self::default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A simple level (`info`, `debug`, ...) or `EnvFilter` directives.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr. When disabled, events are filtered but discarded.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config value `{path}`: {message}")]
    InvalidValue { path: &'static str, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` carries a source snippet; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl JavelinConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: JavelinConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from [`JAVELIN_CONFIG_ENV_VAR`] when it is set, otherwise return defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path_from_env() {
            Some(path) => Self::load_from_path(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.parser.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                path: "parser.max_depth",
                message: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(JAVELIN_CONFIG_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_uses_defaults() {
        let config = JavelinConfig::from_toml_str("").unwrap();
        assert_eq!(config, JavelinConfig::default());
        assert_eq!(config.parser.mode, ParseMode::Diet);
        assert_eq!(config.parser.max_depth, 256);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.stderr);
    }

    #[test]
    fn parses_all_sections() {
        let config = JavelinConfig::from_toml_str(
            r#"
[parser]
mode = "method"
max_depth = 64

[logging]
level = "javelin.recovery=debug"
json = true
stderr = false
"#,
        )
        .unwrap();
        assert_eq!(
            config,
            JavelinConfig {
                parser: ParserConfig {
                    mode: ParseMode::Method,
                    max_depth: 64,
                },
                logging: LoggingConfig {
                    level: "javelin.recovery=debug".to_owned(),
                    json: true,
                    stderr: false,
                },
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = JavelinConfig::from_toml_str("[parser]\nmood = \"diet\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err}");
        assert!(err.to_string().contains("mood"), "{err}");

        let err = JavelinConfig::from_toml_str("[server]\nport = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = JavelinConfig::from_toml_str("[parser]\nmode = \"full\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    }

    #[test]
    fn zero_max_depth_is_invalid() {
        let err = JavelinConfig::from_toml_str("[parser]\nmax_depth = 0\n").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { path: "parser.max_depth", .. }),
            "{err}"
        );
    }

    #[test]
    fn load_from_path_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("javelin.toml");
        std::fs::write(&path, "[parser]\nmode = \"method\"\n").unwrap();

        let config = JavelinConfig::load_from_path(&path).unwrap();
        assert_eq!(config.parser.mode, ParseMode::Method);

        let missing = dir.path().join("missing.toml");
        let err = JavelinConfig::load_from_path(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err}");
    }
}
