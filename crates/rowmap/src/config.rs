//! Configuration file handling.
//!
//! Looks for `.config/rowmap.toml` in the current directory or any parent
//! directory. Connection settings can be overridden from the environment
//! (a `.env` file is honored):
//!
//! - `ROWMAP_DATABASE_URL`
//! - `ROWMAP_DATABASE_USER`
//! - `ROWMAP_DATABASE_PASSWORD`
//!
//! ```toml
//! [mysql]
//! url = "mysql://localhost:3306/app"
//! username = "app"
//! max_connections = 4
//!
//! [yaml]
//! root = "data/db"
//!
//! [migrate]
//! batch_alter = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".config/rowmap.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Relational backend settings.
    pub mysql: Option<MySqlConfig>,
    /// File backend settings.
    pub yaml: Option<YamlConfig>,
    /// Migration behavior.
    pub migrate: MigrateConfig,
}

/// How to reach the MySQL server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MySqlConfig {
    /// Connection URL, e.g. `mysql://localhost:3306/app`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Pool size. One connection serves the whole process by default.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    1
}

impl MySqlConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Where the file store keeps its documents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct YamlConfig {
    pub root: PathBuf,
}

impl Default for YamlConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("db"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    /// Apply all steps of a table's migration in one `ALTER TABLE`.
    pub batch_alter: bool,
}

/// Load configuration from `.config/rowmap.toml`, searching up the directory tree.
pub fn load() -> Result<(Config, PathBuf), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
///
/// Environment overrides are applied on top of the file.
pub fn load_from(start: &Path) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = find_config_file(start)?;
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let mut config = parse(&content)?;
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    config.apply_env(|key| std::env::var(key).ok());

    Ok((config, config_path))
}

/// Parse a configuration document.
pub fn parse(content: &str) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
}

impl Config {
    /// Apply `ROWMAP_DATABASE_*` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ROWMAP_DATABASE_URL") {
            match &mut self.mysql {
                Some(mysql) => mysql.url = url,
                None => self.mysql = Some(MySqlConfig::new(url)),
            }
        }
        if let Some(mysql) = &mut self.mysql {
            if let Some(user) = lookup("ROWMAP_DATABASE_USER") {
                mysql.username = Some(user);
            }
            if let Some(password) = lookup("ROWMAP_DATABASE_PASSWORD") {
                mysql.password = Some(password);
            }
        }
    }
}

/// Find `.config/rowmap.toml` by searching up the directory tree.
fn find_config_file(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No `.config/rowmap.toml` found in any parent directory
    #[error("no .config/rowmap.toml found in current directory or any parent")]
    NotFound,
    /// I/O error reading the file
    #[error("failed to read .config/rowmap.toml: {0}")]
    Io(String),
    /// Parse error in the TOML file
    #[error("failed to parse .config/rowmap.toml: {0}")]
    Parse(String),
    /// A backend was requested but its section is absent
    #[error("configuration has no [{0}] section")]
    MissingSection(&'static str),
}
