// Configuration module entry point
// Server configuration from the command line, ambient settings from file and
// environment, and the shared application state

mod state;
mod types;

use std::path::Path;

// Re-export public types
pub use state::AppState;
pub use types::{
    normalize_virtual_path, HttpConfig, ListenAddr, LogLevel, LoggingConfig, PerformanceConfig,
    ServerConfig, Settings, DEFAULT_PORT,
};

/// Prefix of environment variables overriding settings, e.g. `ABSERVE_LOGGING__LEVEL`
pub const ENV_PREFIX: &str = "ABSERVE";

impl Settings {
    /// Load settings: defaults, then the optional file, then the environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("logging.level", "warn")?
            .set_default("logging.access_log", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.backlog", 128)?
            .set_default("http.directory_listing", true)?;

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: LogLevel::Warn,
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                workers: None,
                max_connections: None,
                keep_alive: true,
                backlog: 128,
            },
            http: HttpConfig {
                server_name: None,
                cache_control: None,
                index_files: vec!["index.html".to_string()],
                directory_listing: true,
            },
        }
    }
}
