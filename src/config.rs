use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub wake: WakeConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    /// Bot authentication token. `TELEGRAM_TOKEN` overrides this.
    #[serde(default)]
    pub bot_token: String,
    /// Externally reachable base URL for webhook registration.
    /// `PUBLIC_URL` overrides this.
    #[serde(default)]
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
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

/// Cold-wake heuristic tuning. The defaults match the hosting provider's
/// observed cold-start behavior; there is nothing principled about them.
#[derive(Debug, Deserialize, Clone)]
pub struct WakeConfig {
    #[serde(default = "default_idle_threshold_secs")]
    pub idle_threshold_secs: u64,
    #[serde(default = "default_wake_delay_ms")]
    pub wake_delay_ms: u64,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            idle_threshold_secs: default_idle_threshold_secs(),
            wake_delay_ms: default_wake_delay_ms(),
        }
    }
}

impl WakeConfig {
    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn wake_delay(&self) -> Duration {
        Duration::from_millis(self.wake_delay_ms)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_idle_threshold_secs() -> u64 {
    600
}

fn default_wake_delay_ms() -> u64 {
    2000
}

impl Config {
    /// Loads configuration from a TOML file, then applies environment
    /// overrides. A missing file is not an error: everything can come from
    /// the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Config::default()
        };

        if let Ok(token) = std::env::var("TELEGRAM_TOKEN") {
            if !token.is_empty() {
                config.telegram.bot_token = token;
            }
        }
        if let Ok(url) = std::env::var("PUBLIC_URL") {
            if !url.is_empty() {
                config.telegram.public_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Into::into)
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            bail!("No bot token: set TELEGRAM_TOKEN or [telegram] bot_token");
        }
        if self.telegram.public_url.is_empty() {
            bail!("No public URL: set PUBLIC_URL or [telegram] public_url");
        }
        url::Url::parse(&self.telegram.public_url)
            .with_context(|| format!("Invalid public URL: {}", self.telegram.public_url))?;
        Ok(())
    }
}
