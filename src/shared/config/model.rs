use serde::Deserialize;

use crate::engine::core::sink::SinkMode;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub merge: MergeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    /// How long a paused merge waits for its next step grant before it hibernates.
    #[serde(default = "default_idle_hibernate_ms")]
    pub idle_hibernate_ms: u64,
    /// Target encoded size of one output batch frame.
    #[serde(default = "default_batch_bytes")]
    pub batch_bytes: usize,
    #[serde(default)]
    pub sink_mode: SinkMode,
    /// Burst size used by the CLI when driving a throttled merge.
    #[serde(default = "default_step")]
    pub default_step: u64,
}

fn default_idle_hibernate_ms() -> u64 {
    3000
}

fn default_batch_bytes() -> usize {
    4096
}

fn default_step() -> u64 {
    1024
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            idle_hibernate_ms: default_idle_hibernate_ms(),
            batch_bytes: default_batch_bytes(),
            sink_mode: SinkMode::default(),
            default_step: default_step(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("SNELMERGE_CONFIG").unwrap_or_else(|_| "config".to_string());
    load_settings_from(&config_path)
}

pub fn load_settings_from(config_path: &str) -> Result<Settings, config::ConfigError> {
    let settings: Settings = config::Config::builder()
        .set_default("merge.idle_hibernate_ms", default_idle_hibernate_ms() as i64)?
        .set_default("merge.batch_bytes", default_batch_bytes() as i64)?
        .set_default("merge.sink_mode", "embedded")?
        .set_default("merge.default_step", default_step() as i64)?
        .set_default("logging.log_dir", "logs")?
        .set_default("logging.stdout_level", "info")?
        .set_default("logging.file_level", "debug")?
        .add_source(config::File::with_name(config_path).required(false))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
