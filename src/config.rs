//! Configuration handling for sqltest.
//!
//! Two kinds of configuration live here:
//! - [`DataSourceConfig`], written by the test suite to say which database to use;
//! - [`SuiteOptions`], read from `SQLTEST_*` environment variables, controlling
//!   reduced mode and logging.

use clap::Parser;
use clap::builder::BoolishValueParser;
use tracing::warn;

/// Environment variable that switches the suite into reduced mode.
pub const SHORT_MODE_ENV: &str = "SQLTEST_SHORT";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Which half of the data source a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    DriverName,
    ConnectString,
}

impl std::fmt::Display for ConfigField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DriverName => write!(f, "driver name"),
            Self::ConnectString => write!(f, "connect string"),
        }
    }
}

/// Data source configuration: a driver name plus a connect string.
///
/// Both can be set directly with [`setup`](Self::setup), and either can be
/// overridden from an environment variable registered with
/// [`env_setup`](Self::env_setup). Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSourceConfig {
    driver_name: String,
    data_source_name: String,
    driver_env_var: String,
    data_source_env_var: String,
}

impl DataSourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direct driver name and connect string.
    pub fn setup(&mut self, driver: impl Into<String>, data_source: impl Into<String>) -> &mut Self {
        self.driver_name = driver.into();
        self.data_source_name = data_source.into();
        self
    }

    /// Set the names of the environment variables that override the direct
    /// values. An empty name disables the override for that field.
    pub fn env_setup(
        &mut self,
        driver_var: impl Into<String>,
        data_source_var: impl Into<String>,
    ) -> &mut Self {
        self.driver_env_var = driver_var.into();
        self.data_source_env_var = data_source_var.into();
        self
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn data_source_name(&self) -> &str {
        &self.data_source_name
    }

    pub fn driver_env_var(&self) -> &str {
        &self.driver_env_var
    }

    pub fn data_source_env_var(&self) -> &str {
        &self.data_source_env_var
    }

    /// Direct value and override variable name for `field`.
    pub(crate) fn field(&self, field: ConfigField) -> (&str, &str) {
        match field {
            ConfigField::DriverName => (&self.driver_name, &self.driver_env_var),
            ConfigField::ConnectString => (&self.data_source_name, &self.data_source_env_var),
        }
    }
}

/// Whether database tests run or are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestMode {
    #[default]
    Full,
    /// Reduced mode: every test asking for a transaction is skipped.
    Short,
}

impl TestMode {
    pub fn is_short(&self) -> bool {
        matches!(self, Self::Short)
    }
}

impl std::fmt::Display for TestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Suite-wide options.
///
/// Test binaries own their command line, so these are parsed from a
/// synthetic argument list: only environment variables and defaults apply.
#[derive(Debug, Clone, Parser)]
#[command(name = "sqltest", about = "Database integration test options")]
pub struct SuiteOptions {
    /// Skip every test that needs a database
    #[arg(long, env = "SQLTEST_SHORT", value_parser = BoolishValueParser::new())]
    pub short: bool,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, default_value = DEFAULT_LOG_LEVEL, env = "SQLTEST_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "SQLTEST_JSON_LOGS", value_parser = BoolishValueParser::new())]
    pub json_logs: bool,
}

impl SuiteOptions {
    /// Read options from the process environment.
    ///
    /// Invalid values are reported and replaced by the defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["sqltest"]).unwrap_or_else(|err| {
            warn!(error = %err, "Ignoring invalid SQLTEST_* environment options");
            Self::default()
        })
    }

    pub fn mode(&self) -> TestMode {
        if self.short {
            TestMode::Short
        } else {
            TestMode::Full
        }
    }
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            short: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}
