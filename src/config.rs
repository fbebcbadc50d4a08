use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Public URL the Bot API pushes updates to.
    pub webhook_url: String,
    /// Alternative Bot API server, e.g. a self-hosted one.
    #[serde(default)]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GeneralConfig {
    /// Dump every received message in full at debug level.
    #[serde(default)]
    pub debug: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1986
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        if config.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("missing telegram.bot_token");
        }
        if config.telegram.webhook_url.trim().is_empty() {
            anyhow::bail!("missing telegram.webhook_url");
        }

        Ok(config)
    }

    /// `host:port` for the webhook listener; IPv6 hosts are bracketed.
    pub fn listen_addr(&self) -> String {
        let ListenerConfig { host, port } = &self.listener;
        if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        }
    }
}
