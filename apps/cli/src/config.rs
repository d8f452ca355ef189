//! CLI configuration.
//!
//! Layered, later sources winning:
//! 1. Built-in defaults
//! 2. `stockwise.toml` in the working directory, or the file given by `--config`
//! 3. `STOCKWISE_*` environment variables (`STOCKWISE_DATABASE_PATH`, ...)
//! 4. Command-line flags

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use stockwise_core::Money;

const ENV_PREFIX: &str = "STOCKWISE";
const DEFAULT_FILE: &str = "stockwise";

/// Resolved CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Prefix for displayed amounts. Display only; precision is fixed.
    pub currency_symbol: String,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from all layers.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with_prefix(overrides, ENV_PREFIX)
    }

    fn load_with_prefix(overrides: &Overrides, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database_path", "stockwise.db")?
            .set_default("currency_symbol", "$")?;

        builder = match &overrides.config_file {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_FILE).required(false)),
        };

        builder = builder
            .add_source(Environment::with_prefix(env_prefix))
            .set_override_option(
                "database_path",
                overrides
                    .database_path
                    .as_deref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?;

        builder.build()?.try_deserialize()
    }

    /// Formats an amount with the configured symbol, e.g. `$116.67` or `-$5.00`.
    pub fn money(&self, amount: Money) -> String {
        if amount.is_negative() {
            format!("-{}{}", self.currency_symbol, -amount)
        } else {
            format!("{}{}", self.currency_symbol, amount)
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load_with_prefix(&Overrides::default(), "STOCKWISE_TEST_DEFAULTS").unwrap();
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.database_path, PathBuf::from("stockwise.db"));
    }

    #[test]
    fn test_file_then_env_then_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "database_path = \"from-file.db\"").unwrap();
        writeln!(file, "currency_symbol = \"€\"").unwrap();

        let mut overrides = Overrides {
            config_file: Some(path),
            database_path: None,
        };

        let config = AppConfig::load_with_prefix(&overrides, "STOCKWISE_TEST_LAYERS").unwrap();
        assert_eq!(config.database_path, PathBuf::from("from-file.db"));
        assert_eq!(config.currency_symbol, "€");

        std::env::set_var("STOCKWISE_TEST_LAYERS_CURRENCY_SYMBOL", "£");
        let config = AppConfig::load_with_prefix(&overrides, "STOCKWISE_TEST_LAYERS").unwrap();
        assert_eq!(config.currency_symbol, "£");

        overrides.database_path = Some(PathBuf::from("flag.db"));
        let config = AppConfig::load_with_prefix(&overrides, "STOCKWISE_TEST_LAYERS").unwrap();
        assert_eq!(config.database_path, PathBuf::from("flag.db"));
        std::env::remove_var("STOCKWISE_TEST_LAYERS_CURRENCY_SYMBOL");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let overrides = Overrides {
            config_file: Some(PathBuf::from("/nonexistent/stockwise.toml")),
            database_path: None,
        };
        assert!(AppConfig::load_with_prefix(&overrides, "STOCKWISE_TEST_MISSING").is_err());
    }

    #[test]
    fn test_money_display() {
        let config = AppConfig {
            database_path: PathBuf::from("x.db"),
            currency_symbol: "$".to_string(),
        };
        assert_eq!(config.money(Money::from_cents(11_667)), "$116.67");
        assert_eq!(config.money(Money::from_cents(-500)), "-$5.00");
        assert_eq!(config.money(Money::zero()), "$0.00");
    }
}
