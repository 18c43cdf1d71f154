use crate::Args;
use serde::Deserialize;
use sqlbridge_sql::connection::DatabaseOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: Option<u64>,
    #[serde(default)]
    pub foreign_keys: bool,
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: None,
            foreign_keys: false,
            create_if_missing: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Builds the effective configuration: the optional TOML file first,
    /// then command-line overrides.
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        if let Some(database) = &args.database {
            config.database.path = Some(database.clone());
        }
        if let Some(level) = &args.log_level {
            config.logging.level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(contents)?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        match &self.database.path {
            Some(path) if !path.as_os_str().is_empty() => {}
            _ => return Err(anyhow::anyhow!("database file argument required")),
        }
        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> anyhow::Result<Level> {
        Level::from_str(&self.logging.level)
            .map_err(|_| anyhow::anyhow!(format!("invalid log level {}", self.logging.level)))
    }

    pub fn database_options(&self) -> anyhow::Result<DatabaseOptions> {
        let path = self
            .database
            .path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("database file argument required"))?;
        let mut options = DatabaseOptions::new(path);
        options.busy_timeout = self.database.busy_timeout_ms.map(Duration::from_millis);
        options.foreign_keys = self.database.foreign_keys;
        options.create_if_missing = self.database.create_if_missing;
        Ok(options)
    }
}
