//! Configuration module

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub cubo: CuboConfig,
    #[serde(default)]
    pub platforms: PlatformOptions,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Cubo Casa account and polling settings (the credential entry form)
#[derive(Debug, Clone, Deserialize)]
pub struct CuboConfig {
    pub token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Clear an unconfirmed lock/unlock after this many seconds. Unset keeps it forever.
    #[serde(default)]
    pub pending_timeout_secs: Option<u64>,
}

impl CuboConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn pending_timeout(&self) -> Option<Duration> {
        self.pending_timeout_secs.map(Duration::from_secs)
    }
}

/// Per-platform enable toggles
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformOptions {
    #[serde(default = "default_enabled")]
    pub lock: bool,
}

impl Default for PlatformOptions {
    fn default() -> Self {
        Self {
            lock: default_enabled(),
        }
    }
}

impl PlatformOptions {
    pub fn enabled(&self) -> Vec<&'static str> {
        let mut platforms = Vec::new();
        if self.lock {
            platforms.push("lock");
        }
        platforms
    }
}

/// Static integration identity, passed to whatever needs the domain or name
#[derive(Debug, Clone)]
pub struct IntegrationInfo {
    pub name: &'static str,
    pub domain: &'static str,
    pub version: &'static str,
    pub issue_url: &'static str,
}

impl Default for IntegrationInfo {
    fn default() -> Self {
        Self {
            name: "Cubo Casa",
            domain: "cubocasa",
            version: env!("CARGO_PKG_VERSION"),
            issue_url: "https://github.com/mmacvicar/cubo-casa/issues",
        }
    }
}

impl IntegrationInfo {
    pub fn startup_message(&self) -> String {
        format!(
            "{} v{} ({}) - report issues at {}",
            self.name, self.version, self.domain, self.issue_url
        )
    }
}

pub const DEFAULT_BASE_URL: &str = "https://iot.cubo.casa";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_scan_interval() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_enabled() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8123
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("CUBOCASA").separator("__"))
            .build()?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Invalid configuration (is cubo.token set?): {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_toml("[cubo]\ntoken = \"abc\"\n").unwrap();

        assert_eq!(config.cubo.token, "abc");
        assert_eq!(config.cubo.base_url, "https://iot.cubo.casa");
        assert_eq!(config.cubo.scan_interval(), Duration::from_secs(10));
        assert_eq!(config.cubo.max_retries, 3);
        assert_eq!(config.cubo.backoff_factor, 2.0);
        assert_eq!(config.cubo.pending_timeout(), None);
        assert_eq!(config.server.port, 8123);
        assert!(config.platforms.lock);
    }

    #[test]
    fn test_overrides() {
        let config = from_toml(
            r#"
            [server]
            port = 9000

            [cubo]
            token = "abc"
            base_url = "http://localhost:8080"
            scan_interval_secs = 30
            pending_timeout_secs = 120

            [platforms]
            lock = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cubo.base_url, "http://localhost:8080");
        assert_eq!(config.cubo.scan_interval(), Duration::from_secs(30));
        assert_eq!(config.cubo.pending_timeout(), Some(Duration::from_secs(120)));
        assert!(config.platforms.enabled().is_empty());
    }

    #[test]
    fn test_token_required() {
        assert!(from_toml("[server]\nport = 9000\n").is_err());
    }

    #[test]
    fn test_zero_scan_interval_clamped() {
        let config = from_toml("[cubo]\ntoken = \"abc\"\nscan_interval_secs = 0\n").unwrap();
        assert_eq!(config.cubo.scan_interval(), Duration::from_secs(1));
    }
}
