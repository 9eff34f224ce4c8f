use crate::{
    CONFIG_DIR_ENV, CONFIG_FILE_NAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIR,
    DispatchConfig, GeneratorConfig, LoggingConfig, ServerConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub generator: GeneratorConfig,
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for HERALD_CONFIG_DIR env var, else use ./.herald/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply HERALD_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: HERALD_CONFIG_DIR env var > ./.herald/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all sections. Call after load() to catch errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.generator.validate()?;
        self.dispatch.validate()?;
        Ok(())
    }

    /// Absolute overflow directory; relative values resolve against the config dir.
    pub fn overflow_dir(&self) -> ConfigErrorResult<PathBuf> {
        let dir = Path::new(&self.generator.overflow_dir);
        if dir.is_absolute() {
            return Ok(dir.to_path_buf());
        }
        Ok(Self::config_dir()?.join(dir))
    }

    /// Directory for the log file, resolved the same way as `overflow_dir`.
    pub fn log_dir(&self) -> ConfigErrorResult<PathBuf> {
        let dir = Path::new(&self.logging.dir);
        if dir.is_absolute() {
            return Ok(dir.to_path_buf());
        }
        Ok(Self::config_dir()?.join(dir))
    }

    /// Buffer occupancy below which the generator drains overflow back.
    pub fn refill_threshold(&self) -> usize {
        self.generator.effective_refill_threshold()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {}:{} (max {} connections)",
            self.server.host, self.server.port, self.server.max_connections
        );
        info!(
            "  generator: {} msg every {}ms, buffer={}, refill below {}, overflow={}",
            self.generator.messages_per_tick,
            self.generator.tick_interval_ms,
            self.generator.buffer_capacity,
            self.refill_threshold(),
            self.generator.overflow_dir
        );
        info!(
            "  dispatch: timeout={}ms, in_flight={}, inbound={}",
            self.dispatch.round_timeout_ms,
            self.dispatch.effective_max_in_flight(),
            self.dispatch.inbound_buffer_size
        );
        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("HERALD_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("HERALD_SERVER_PORT", &mut self.server.port);
        Self::apply_env_parse(
            "HERALD_SERVER_MAX_CONNECTIONS",
            &mut self.server.max_connections,
        );

        // Generator
        Self::apply_env_parse(
            "HERALD_GENERATOR_MESSAGES_PER_TICK",
            &mut self.generator.messages_per_tick,
        );
        Self::apply_env_parse(
            "HERALD_GENERATOR_TICK_INTERVAL_MS",
            &mut self.generator.tick_interval_ms,
        );
        Self::apply_env_parse(
            "HERALD_GENERATOR_BUFFER_CAPACITY",
            &mut self.generator.buffer_capacity,
        );
        Self::apply_env_option_parse(
            "HERALD_GENERATOR_REFILL_THRESHOLD",
            &mut self.generator.refill_threshold,
        );
        Self::apply_env_string(
            "HERALD_GENERATOR_OVERFLOW_DIR",
            &mut self.generator.overflow_dir,
        );

        // Dispatch
        Self::apply_env_parse(
            "HERALD_DISPATCH_ROUND_TIMEOUT_MS",
            &mut self.dispatch.round_timeout_ms,
        );
        Self::apply_env_parse(
            "HERALD_DISPATCH_MAX_IN_FLIGHT",
            &mut self.dispatch.max_in_flight,
        );
        Self::apply_env_parse(
            "HERALD_DISPATCH_INBOUND_BUFFER_SIZE",
            &mut self.dispatch.inbound_buffer_size,
        );

        // Logging
        Self::apply_env_parse("HERALD_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("HERALD_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("HERALD_LOG_FILE", &mut self.logging.file);
    }

    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Accepts "true"/"1"; anything else is false.
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Unparseable values are ignored and the previous value kept.
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    fn apply_env_option_parse<T: std::str::FromStr>(var_name: &str, target: &mut Option<T>) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = Some(parsed);
        }
    }

    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
