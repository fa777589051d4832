use crate::error::Result;
use crate::feeds::push::websocket_url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "memedash";
const CONFIG_FILENAME: &str = "config.toml";

/// Dashboard configuration, read from `config.toml`.
///
/// Every section is optional; a missing file or section means defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub refresh: RefreshConfig,
    pub alerts: AlertsConfig,
    pub tweets: TweetsConfig,
    pub tokens: TokensConfig,
    pub influencers: InfluencersConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    /// Push endpoint. Derived from `base_url` when unset.
    pub websocket_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            websocket_url: None,
            request_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub poll_interval_ms: u64,
    pub reconnect_delay_ms: u64,
    pub poll_alerts: bool,
    pub poll_tweets: bool,
    pub poll_tokens: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
            reconnect_delay_ms: 5_000,
            poll_alerts: true,
            poll_tweets: true,
            poll_tokens: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub title: String,
    pub position: Position,
    pub max_items: Option<usize>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            title: "Meme Coin Alerts".to_string(),
            position: Position { row: 0, col: 0 },
            max_items: Some(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweetsConfig {
    pub title: String,
    pub position: Position,
    pub max_items: Option<usize>,
}

impl Default for TweetsConfig {
    fn default() -> Self {
        Self {
            title: "Influencer Tweets".to_string(),
            position: Position { row: 0, col: 1 },
            max_items: Some(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensConfig {
    pub title: String,
    pub position: Position,
    /// Tokens are kept unbounded unless a cap is configured.
    pub max_items: Option<usize>,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            title: "Creator Tokens".to_string(),
            position: Position { row: 1, col: 0 },
            max_items: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluencersConfig {
    pub title: String,
    pub position: Position,
}

impl Default for InfluencersConfig {
    fn default() -> Self {
        Self {
            title: "Tracked Influencers".to_string(),
            position: Position { row: 1, col: 1 },
        }
    }
}

impl Config {
    /// `<config dir>/memedash/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
    }

    /// Loads `path`, or the default location when `path` is `None`.
    ///
    /// A missing file at the default location yields defaults. An explicitly
    /// given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.server.base_url = url;
        }
        self
    }

    pub fn websocket_url(&self) -> String {
        self.server
            .websocket_url
            .clone()
            .unwrap_or_else(|| websocket_url(&self.server.base_url))
    }
}
