//! Environment-backed defaults for the CLI.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

pub const MODEL_ENV: &str = "MINEQUERY_MODEL";
pub const LOG_ENV: &str = "MINEQUERY_LOG";

/// Settings read from the environment. Command-line flags win over these.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub model_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self {
            model_path: std::env::var_os(MODEL_ENV).map(PathBuf::from),
            log_level: std::env::var(LOG_ENV).ok(),
        }
    }

    pub fn model_path(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.model_path.clone()).ok_or_else(|| {
            anyhow!("no model given: pass --model or set {MODEL_ENV}")
        })
    }

    /// `--verbose` forces debug; otherwise `MINEQUERY_LOG`, defaulting to warn.
    pub fn log_level(&self, verbose: bool) -> Result<Level> {
        if verbose {
            return Ok(Level::DEBUG);
        }
        match self.log_level.as_deref() {
            None => Ok(Level::WARN),
            Some(text) => Level::from_str(text)
                .map_err(|_| anyhow!("invalid {LOG_ENV} value `{text}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_environment_model() {
        let config = CliConfig {
            model_path: Some(PathBuf::from("env.json")),
            log_level: None,
        };
        assert_eq!(
            config.model_path(Some(PathBuf::from("flag.json"))).unwrap(),
            PathBuf::from("flag.json")
        );
        assert_eq!(config.model_path(None).unwrap(), PathBuf::from("env.json"));
        assert!(CliConfig::default().model_path(None).is_err());
    }

    #[test]
    fn log_level_resolution() {
        let config = CliConfig {
            model_path: None,
            log_level: Some("info".to_string()),
        };
        assert_eq!(config.log_level(false).unwrap(), Level::INFO);
        assert_eq!(config.log_level(true).unwrap(), Level::DEBUG);
        assert_eq!(CliConfig::default().log_level(false).unwrap(), Level::WARN);
        let bad = CliConfig {
            model_path: None,
            log_level: Some("loud".to_string()),
        };
        assert!(bad.log_level(false).is_err());
    }
}
