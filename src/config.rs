use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Fallback estimate of steps when a session is started without one.
pub const DEFAULT_ESTIMATED_STEPS: u32 = 5;
/// Fallback cap on compare-and-swap attempts before surfacing a conflict.
pub const DEFAULT_CAS_MAX_RETRIES: u32 = 16;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the thinkmcp server.
#[derive(Debug)]
pub struct Config {
    /// Default estimated step count applied when `start-thinking` omits one.
    pub default_estimated_steps: u32,
    /// Maximum compare-and-swap attempts per session mutation.
    pub cas_max_retries: u32,
    /// Suppress the per-thought banner written to stderr.
    pub disable_thought_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_estimated_steps: DEFAULT_ESTIMATED_STEPS,
            cas_max_retries: DEFAULT_CAS_MAX_RETRIES,
            disable_thought_logging: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    ///
    /// Every variable is optional; the defaults describe a server that needs no
    /// environment at all.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            default_estimated_steps: load_env_parsed("THINK_DEFAULT_ESTIMATE")?
                .unwrap_or(DEFAULT_ESTIMATED_STEPS),
            cas_max_retries: load_env_parsed("THINK_CAS_MAX_RETRIES")?
                .unwrap_or(DEFAULT_CAS_MAX_RETRIES),
            disable_thought_logging: load_env_bool("DISABLE_THOUGHT_LOGGING")?.unwrap_or(false),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed(key: &str) -> Result<Option<u32>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|parsed| *parsed > 0)
                .ok_or_else(|| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn load_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    load_env_optional(key)
        .map(|value| match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key.to_string())),
        })
        .transpose()
}

/// Global configuration cache populated on first access.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, reading the environment on first use.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::from_env().unwrap_or_else(|err| {
            tracing::warn!(%err, "Invalid configuration value; falling back to defaults");
            Config::default()
        })
    })
}

/// Load `.env` and install the configuration in the global cache eagerly.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = get_config();
    tracing::debug!(
        default_estimated_steps = config.default_estimated_steps,
        cas_max_retries = config.cas_max_retries,
        disable_thought_logging = config.disable_thought_logging,
        "Loaded configuration"
    );
}
