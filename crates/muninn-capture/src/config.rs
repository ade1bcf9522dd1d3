//! Capture-layer configuration from environment plus `user_config.toml`.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | MUNINN_LISTEN_TIMEOUT_SECS | 10 | Bounded timeout per capture call (also bounds `stop()`). |
//! | MUNINN_CONTEXT_TURNS | 3 | Turns in a live context window (K). |
//! | MUNINN_TOPIC_CAP | 50 | Max topics retained per identity. |
//! | MUNINN_TOPIC_MIN_LEN | 4 | Words strictly longer than this count as topics. |

use crate::context::DEFAULT_CONTEXT_TURNS;
use crate::memory::DEFAULT_TOPIC_CAP;
use muninn_voice::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunables for the capture subsystem. Unset or invalid env values fall back
/// to the defaults above.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub listen_timeout: Duration,
    pub context_turns: usize,
    pub topic_cap: usize,
    pub topic_min_len: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            listen_timeout: Duration::from_secs(10),
            context_turns: DEFAULT_CONTEXT_TURNS,
            topic_cap: DEFAULT_TOPIC_CAP,
            topic_min_len: 4,
        }
    }
}

impl CaptureConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_timeout: Duration::from_secs(env_u64(
                "MUNINN_LISTEN_TIMEOUT_SECS",
                defaults.listen_timeout.as_secs(),
            )),
            context_turns: env_usize("MUNINN_CONTEXT_TURNS", defaults.context_turns),
            topic_cap: env_usize("MUNINN_TOPIC_CAP", defaults.topic_cap),
            topic_min_len: env_usize("MUNINN_TOPIC_MIN_LEN", defaults.topic_min_len),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn default_true() -> bool {
    true
}

/// User-specific configuration stored in `user_config.toml`: provider
/// credentials and the identity label, so users supply their own keys without
/// touching the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Personal API key for the generation provider.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Preferred model identifier.
    #[serde(default)]
    pub llm_model: Option<String>,

    /// Preferred API base URL.
    #[serde(default)]
    pub llm_api_url: Option<String>,

    /// Identity label for the memory record (defaults to "default").
    #[serde(default)]
    pub user_name: Option<String>,

    /// First run flag - set to false after initial setup.
    #[serde(default = "default_true")]
    pub first_run: bool,
}

impl UserConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from("user_config.toml")
    }

    /// Load from the default path, or create a default file on first run.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from_path(&Self::default_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: UserConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = UserConfig {
                first_run: true,
                ..Default::default()
            };
            config.save_to_path(path)?;
            Ok(config)
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// API key with environment fallback: file, then `MUNINN_LLM_API_KEY`,
    /// then `OPENROUTER_API_KEY`.
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("MUNINN_LLM_API_KEY").ok())
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// Identity label for memory records.
    pub fn identity(&self) -> String {
        self.user_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "default".to_string())
    }

    /// Full provider configuration, or `None` when no key is available.
    pub fn provider(&self) -> Option<ProviderConfig> {
        let mut config = ProviderConfig::new(self.get_api_key()?);
        if let Some(ref url) = self.llm_api_url {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }
        if let Some(ref model) = self.llm_model {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CaptureConfig::default();
        assert_eq!(config.listen_timeout, Duration::from_secs(10));
        assert_eq!(config.context_turns, 3);
        assert_eq!(config.topic_cap, 50);
        assert_eq!(config.topic_min_len, 4);
    }

    #[test]
    fn user_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_config.toml");
        let config = UserConfig {
            api_key: Some("k".to_string()),
            llm_model: Some("some/model".to_string()),
            llm_api_url: None,
            user_name: Some("ada".to_string()),
            first_run: false,
        };
        config.save_to_path(&path).unwrap();
        let loaded = UserConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("k"));
        assert_eq!(loaded.identity(), "ada");
        assert!(!loaded.first_run);

        let provider = loaded.provider().unwrap();
        assert_eq!(provider.model, "some/model");
    }

    #[test]
    fn first_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_config.toml");
        let config = UserConfig::load_from_path(&path).unwrap();
        assert!(config.first_run);
        assert!(path.exists());
        assert_eq!(config.identity(), "default");
    }
}
