//! The `config` module loads server configuration.
//!
//! Values come from an optional config file, then from `STOMPRELAY_*`
//! environment variables (nested keys separated by `__`, for example
//! `STOMPRELAY_SERVER__PORT`), and fall back to `Settings::default()`.

mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{BrokerSettings, LogSettings, ServerSettings, Settings};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "STOMPRELAY";

/// Default config file stem, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Loads the configuration from the default file and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(DEFAULT_CONFIG_FILE)
}

/// Loads the configuration from the file stem `path` (any format the `config`
/// crate recognizes; the file is optional) and environment variables.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_over(Settings::default()))
}
