use std::collections::HashMap;
use tracing::Level;

/// Per-scope log levels, parsed from strings like `warn,teleport=debug,climb=trace`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    global_level: Level,
    scope_levels: HashMap<String, Level>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            global_level: Level::WARN,
            scope_levels: HashMap::new(),
        }
    }

    pub fn from_env(env_var_name: &str) -> Self {
        match std::env::var(env_var_name) {
            Ok(log_config) => Self::parse(&log_config),
            Err(_) => Self::new(),
        }
    }

    pub fn parse(config_str: &str) -> Self {
        let mut config = Self::new();
        config.parse_config_string(config_str);
        config
    }

    fn parse_config_string(&mut self, config_str: &str) {
        for part in config_str.split(',') {
            let part = part.trim();

            if let Some((scope, level)) = part.split_once('=') {
                if let Ok(level) = parse_level(level.trim()) {
                    self.scope_levels.insert(scope.trim().to_string(), level);
                }
            } else if let Ok(level) = parse_level(part) {
                self.global_level = level;
            }
        }
    }

    pub fn should_log(&self, scope: &str, level: Level) -> bool {
        let target_level = self.scope_levels.get(scope).unwrap_or(&self.global_level);
        level <= *target_level
    }

    pub fn global_level(&self) -> Level {
        self.global_level
    }

    pub fn set_global_level(&mut self, level: Level) {
        self.global_level = level;
    }

    pub fn set_scope_level(&mut self, scope: String, level: Level) {
        self.scope_levels.insert(scope, level);
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_level(level_str: &str) -> Result<Level, ()> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(()),
    }
}

/// Initialize logging with the specified environment variable name.
///
/// The subscriber itself honours `RUST_LOG`; the scope table comes from
/// `env_var_name`, e.g. `VRGROUNDS_LOG=info,climb=debug`. Calling this
/// twice keeps the first subscriber and the first scope table.
pub fn init_logging(env_var_name: &str) -> LogConfig {
    let config = LogConfig::from_env(env_var_name);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(config.global_level().as_str().to_lowercase())
    });

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    super::set_log_config(config.clone());
    config
}
