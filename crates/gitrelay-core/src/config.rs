use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable prefix, e.g. `GITRELAY__TELEGRAM__BOT_TOKEN`.
pub const ENV_PREFIX: &str = "GITRELAY";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    /// Enables the raw payload capture route
    #[serde(default)]
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Self::environment(ENV_PREFIX))
    }

    /// Load configuration from file with environment overrides
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name(path))
            .add_source(Self::environment(ENV_PREFIX));

        Self::finish(builder.build()?)
    }

    fn environment(prefix: &str) -> Environment {
        Environment::with_prefix(prefix)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("telegram.api_url", default_api_url())?
            .set_default("telegram.timeout_secs", default_timeout_secs() as i64)?
            .set_default("debug", false)
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let builder = Self::defaults(Config::builder())?.add_source(env);
        Self::finish(builder.build()?)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let app: Self = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "telegram.bot_token must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }

    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8009
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::environment(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_load_defaults_from_environment() {
        let config =
            AppConfig::from_environment(env(&[("GITRELAY__TELEGRAM__BOT_TOKEN", "123:abc")]))
                .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.telegram.timeout(), Duration::from_secs(30));
        assert_eq!(config.server.address(), "127.0.0.1:8009");
        assert!(!config.debug);
    }

    #[test]
    fn test_load_overrides_from_environment() {
        let config = AppConfig::from_environment(env(&[
            ("GITRELAY__TELEGRAM__BOT_TOKEN", "123:abc"),
            ("GITRELAY__SERVER__PORT", "9000"),
            ("GITRELAY__DEBUG", "true"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.debug);
    }

    #[test]
    fn test_missing_token_is_rejected() {
        assert!(AppConfig::from_environment(env(&[])).is_err());
        assert!(
            AppConfig::from_environment(env(&[("GITRELAY__TELEGRAM__BOT_TOKEN", " ")])).is_err()
        );
    }

    #[test]
    fn test_server_config_creation() {
        let config = ServerConfig::new()
            .with_host("0.0.0.0".to_string())
            .with_port(3000);

        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_telegram_config_creation() {
        let config = TelegramConfig::new("token".to_string())
            .with_api_url("http://localhost:8081".to_string());

        assert_eq!(config.api_url, "http://localhost:8081");
        assert_eq!(config.timeout_secs, 30);
    }
}
