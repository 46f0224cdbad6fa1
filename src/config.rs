//! Service configuration.
//!
//! Values come from the process environment (or any set of key/value pairs,
//! for tests) through the `config` crate. Each section is deserialized from
//! its own prefixed view of the variables; empty values count as unset.
//! Provider selection is one name per capability category; provider
//! credentials are opaque here and handed verbatim to provider constructors.

use std::time::Duration;

use ::config::Environment;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

type Vars = ::config::Map<String, String>;

/// Base trait for configuration sections.
///
/// # Example
///
/// ```rust
/// use stash_core::{Config, ConfigError, ConfigResult};
///
/// struct Workers {
///     count: u32,
/// }
///
/// impl Config for Workers {
///     fn name(&self) -> &str {
///         "workers"
///     }
///
///     fn validate(&self) -> ConfigResult<()> {
///         if self.count == 0 {
///             return Err(ConfigError::Invalid {
///                 key: "WORKERS".into(),
///                 value: "0".into(),
///                 reason: "must be greater than 0".into(),
///             });
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Config: Send + Sync {
    /// Returns the configuration section name.
    fn name(&self) -> &str {
        "default"
    }

    /// Returns the timeout duration, if the section has one.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Validates the configuration.
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }
}

/// HTTP server and process settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// `production` switches logging to JSON.
    pub environment: String,
    pub log_level: String,
}

impl ServerConfig {
    /// True when running with `ENVIRONMENT=production`.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            environment: "development".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config for ServerConfig {
    fn name(&self) -> &str {
        "server"
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                key: "PORT".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auto_migrate: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
}

/// Health check settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub probe_timeout_ms: u64,
}

impl HealthConfig {
    /// Per-probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 2000,
        }
    }
}

impl Config for HealthConfig {
    fn name(&self) -> &str {
        "health"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.probe_timeout())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "HEALTH_PROBE_TIMEOUT_MS".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Which registered provider to resolve for each capability category.
///
/// Email providers are selected per connected mailbox, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderSelection {
    #[serde(rename = "auth_provider")]
    pub auth: String,
    #[serde(rename = "llm_provider")]
    pub llm: String,
    #[serde(rename = "exchange_rate_provider")]
    pub exchange_rate: String,
    #[serde(rename = "notification_provider")]
    pub notification: String,
}

impl Default for ProviderSelection {
    fn default() -> Self {
        Self {
            auth: "supabase".to_string(),
            llm: "openai".to_string(),
            exchange_rate: "openexchangerates".to_string(),
            notification: "fcm".to_string(),
        }
    }
}

impl Config for ProviderSelection {
    fn name(&self) -> &str {
        "providers"
    }

    fn validate(&self) -> ConfigResult<()> {
        let selections = [
            ("AUTH_PROVIDER", &self.auth),
            ("LLM_PROVIDER", &self.llm),
            ("EXCHANGE_RATE_PROVIDER", &self.exchange_rate),
            ("NOTIFICATION_PROVIDER", &self.notification),
        ];
        for (key, value) in selections {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    value: value.clone(),
                    reason: "provider name must not be blank".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GmailConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub pubsub_topic: String,
    pub webhook_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OpenExchangeRatesConfig {
    pub app_id: String,
    pub base_url: String,
}

impl Default for OpenExchangeRatesConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            base_url: "https://openexchangerates.org/api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FcmConfig {
    pub credentials_file: String,
    pub project_id: String,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub health: HealthConfig,
    pub providers: ProviderSelection,
    pub gmail: GmailConfig,
    pub supabase: SupabaseConfig,
    pub openai: OpenAiConfig,
    pub open_exchange_rates: OpenExchangeRatesConfig,
    pub fcm: FcmConfig,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load from explicit key/value pairs and validate the result.
    pub fn from_vars<I, K, V>(vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let database: DatabaseConfig = section(&vars, "DATABASE", true)?;
        if database.url.is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL".to_string()));
        }
        let redis: RedisConfig = section(&vars, "REDIS", false)?;
        if redis.url.is_empty() {
            return Err(ConfigError::Missing("REDIS_URL".to_string()));
        }

        let config = Self {
            server: section(&vars, "", true)?,
            database,
            redis,
            health: section(&vars, "HEALTH", true)?,
            providers: section(&vars, "", false)?,
            gmail: section(&vars, "GMAIL", false)?,
            supabase: section(&vars, "SUPABASE", false)?,
            openai: section(&vars, "OPENAI", false)?,
            open_exchange_rates: section(&vars, "OPENEXCHANGERATES", false)?,
            fcm: section(&vars, "FCM", false)?,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Deserialize one section from the variables under `prefix`.
///
/// `typed` turns on value parsing for sections holding numbers or flags;
/// credential sections keep the raw strings.
fn section<T: DeserializeOwned>(vars: &Vars, prefix: &str, typed: bool) -> ConfigResult<T> {
    let env = if prefix.is_empty() {
        Environment::default()
    } else {
        Environment::with_prefix(prefix).prefix_separator("_")
    };
    let env = env
        .try_parsing(typed)
        .ignore_empty(true)
        .source(Some(vars.clone()));

    ::config::Config::builder()
        .add_source(env)
        .build()
        .and_then(|loaded| loaded.try_deserialize())
        .map_err(|e| load_error(vars, prefix, e))
}

fn load_error(vars: &Vars, prefix: &str, err: ::config::ConfigError) -> ConfigError {
    match &err {
        ::config::ConfigError::Type { key: Some(field), .. } => {
            let key = if prefix.is_empty() {
                field.to_uppercase()
            } else {
                format!("{prefix}_{}", field.to_uppercase())
            };
            ConfigError::Invalid {
                value: vars.get(&key).cloned().unwrap_or_default(),
                reason: err.to_string(),
                key,
            }
        }
        _ => ConfigError::Source(err.to_string()),
    }
}

impl Config for AppConfig {
    fn name(&self) -> &str {
        "stash"
    }

    fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.health.validate()?;
        self.providers.validate()
    }
}
