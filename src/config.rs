//! Application-level configuration loading, including broadcast tuning knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PUZZLE_RALLY_BACK_CONFIG_PATH";
/// Interval between scoreboard re-pushes when the config does not say otherwise.
const DEFAULT_PUSH_INTERVAL_SECS: u64 = 15;
/// Broadcast channel capacity per event when the config does not say otherwise.
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    push_interval: Duration,
    channel_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        push_interval_secs = app_config.push_interval.as_secs(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// How often the periodic task re-pushes scoreboards to live subscribers.
    pub fn push_interval(&self) -> Duration {
        self.push_interval
    }

    /// Buffered snapshot count per event broadcast channel.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            push_interval: Duration::from_secs(DEFAULT_PUSH_INTERVAL_SECS),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    push_interval_secs: Option<u64>,
    channel_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            push_interval: value
                .push_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.push_interval),
            channel_capacity: value.channel_capacity.unwrap_or(defaults.channel_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
