//! Handles settings for the application. Configuration is written in
//! `homebudget.toml`; every value can be overridden through the
//! `HOMEBUDGET_*` environment or the command line.

use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "homebudget";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the key-value state files.
    pub data_dir: String,
    /// Log level for the env filter.
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            level: "info".to_string(),
        }
    }
}

pub fn load(
    config_path: Option<&str>,
    data_dir: Option<String>,
    level: Option<String>,
) -> Result<AppConfig, config::ConfigError> {
    let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("HOMEBUDGET"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(data_dir) = data_dir {
        settings.data_dir = data_dir;
    }
    if let Some(level) = level {
        settings.level = level;
    }

    Ok(settings)
}
