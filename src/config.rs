// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::binder::DEFAULT_NOTIFICATION_BODY;
use crate::context::AppContext;
use crate::model::Priority;
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;

fn default_notification_body() -> String {
    DEFAULT_NOTIFICATION_BODY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_app_name() -> String {
    "Coursemate".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Body text of every reminder notification.
    #[serde(default = "default_notification_body")]
    pub notification_body: String,

    /// Name shown as the sender of desktop notifications.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// One of off/error/warn/info/debug/trace.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Priority preselected in a blank assignment form.
    #[serde(default)]
    pub default_priority: Priority,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Match the serde defaults
            notification_body: default_notification_body(),
            app_name: default_app_name(),
            log_level: default_log_level(),
            default_priority: Priority::default(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like [`Config::load`], but falls back to defaults. A broken file is logged.
    pub fn load_or_default(ctx: &dyn AppContext) -> Self {
        match Self::load(ctx) {
            Ok(config) => config,
            Err(e) => {
                if !Self::is_missing_config_error(&e) {
                    log::warn!("Using default configuration: {}", e);
                }
                Self::default()
            }
        }
    }

    /// Whether an error from [`Config::load`] only means "no config file yet".
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Parsed `log_level`; unknown values fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Info)
    }
}
