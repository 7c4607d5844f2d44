use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub livekit: LiveKitConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the token server listens on.
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveKitConfig {
    /// LiveKit server URL handed to clients along with their token.
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device name; the default input device when unset.
    pub input_device: Option<String>,
    /// Height of the level meter, and the upper bound of reported levels.
    pub meter_height: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            meter_height: 20,
        }
    }
}

impl LiveKitConfig {
    /// Environment variables take precedence over the config file, so a
    /// deployment can keep credentials out of it entirely.
    fn apply_env(&mut self) {
        for (var, field) in [
            ("LIVEKIT_URL", &mut self.url),
            ("LIVEKIT_KEY", &mut self.api_key),
            ("LIVEKIT_SECRET", &mut self.api_secret),
        ] {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *field = value;
                }
            }
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let mut config = Self::default();
            config.save()?;
            config.livekit.apply_env();
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let mut config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        config.livekit.apply_env();

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.audio.meter_height, 20);
        assert!(config.audio.input_device.is_none());
        assert!(config.livekit.url.is_empty());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.audio.meter_height, 20);
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.livekit.url = "wss://example.livekit.cloud".to_string();
        config.audio.input_device = Some("USB Audio".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.livekit.url, config.livekit.url);
        assert_eq!(parsed.audio.input_device, config.audio.input_device);
    }

    #[test]
    fn test_env_overrides_file_values() {
        std::env::set_var("LIVEKIT_URL", "wss://from-env.livekit.cloud");

        let mut livekit = LiveKitConfig {
            url: "wss://from-file.livekit.cloud".to_string(),
            ..Default::default()
        };
        livekit.apply_env();

        assert_eq!(livekit.url, "wss://from-env.livekit.cloud");
        std::env::remove_var("LIVEKIT_URL");
    }
}
