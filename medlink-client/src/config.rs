use anyhow::{Context, Result};
use medlink_core::IceServerConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay, e.g. `ws://host:4000/ws`.
    pub relay_url: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub negotiation_timeout_secs: u64,
    pub constraints: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:4000/ws".to_owned(),
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
            negotiation_timeout_secs: 30,
            constraints: MediaConstraints::default(),
        }
    }
}

impl ClientConfig {
    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_secs(self.negotiation_timeout_secs)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse client config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)?;
        info!("Loaded client config from {}", path.display());
        Ok(config)
    }
}
