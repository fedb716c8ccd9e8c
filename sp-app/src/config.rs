//! ShellPilot configuration loader.
//!
//! Toml file under `~/.shellpilot`, env overrides applied after parsing, rate
//! limits clamped at load time. A missing file yields the documented defaults
//! so the binary works on first run without a setup step.

use serde::{Deserialize, Serialize};
use sp_core::Policy;
use std::path::{Path, PathBuf};

pub const RATE_LIMIT_MIN: u32 = 10;
pub const RATE_LIMIT_MAX: u32 = 120;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Model candidates tried in order until one responds.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default)]
    pub preferred_shell: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            preferred_shell: None,
            enabled: default_enabled(),
        }
    }
}

fn default_models() -> Vec<String> {
    vec![
        "gpt-4o-mini".to_string(),
        "claude-3-5-haiku-latest".to_string(),
    ]
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeysConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_rate_limit_calls")]
    pub rate_limit_calls: u32,
    #[serde(default = "default_rate_limit_window_minutes")]
    pub rate_limit_window_minutes: i64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_limit_calls: default_rate_limit_calls(),
            rate_limit_window_minutes: default_rate_limit_window_minutes(),
        }
    }
}

fn default_rate_limit_calls() -> u32 {
    60
}

fn default_rate_limit_window_minutes() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub auto_run: bool,
    #[serde(default = "default_confirm_risky")]
    pub confirm_risky: bool,
    #[serde(default = "default_auto_fix")]
    pub auto_fix: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            auto_run: false,
            confirm_risky: default_confirm_risky(),
            auto_fix: default_auto_fix(),
        }
    }
}

fn default_confirm_risky() -> bool {
    true
}

fn default_auto_fix() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Extra dangerous-table entries; `.*` or `\s` marks an entry as a regex.
    #[serde(default)]
    pub extra_dangerous: Vec<String>,
    /// Extra risky-table entries, always regexes.
    #[serde(default)]
    pub extra_risky: Vec<String>,
}

impl AppConfig {
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);

        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => toml::from_str::<AppConfig>(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
            Err(e) => {
                return Err(anyhow::anyhow!("read config {}: {e}", path.display()));
            }
        };

        cfg.apply_env_overrides();
        cfg.clamp_limits();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read the file as stored, without env overrides or clamping. Used by
    /// commands that rewrite the file, so environment secrets never get baked
    /// into it.
    pub async fn load_stored(path: &Path) -> anyhow::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!("read config {}: {e}", path.display())),
        }
    }

    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("create config dir {}: {e}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| anyhow::anyhow!("write config {}: {e}", path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SHELLPILOT_MODEL") {
            if !v.trim().is_empty() {
                self.general.models = vec![v];
            }
        }
        if let Ok(v) = std::env::var("SHELLPILOT_SHELL") {
            if !v.trim().is_empty() {
                self.general.preferred_shell = Some(v);
            }
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            if !v.trim().is_empty() {
                self.keys.openai_api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("ANTHROPIC_API_KEY") {
            if !v.trim().is_empty() {
                self.keys.anthropic_api_key = Some(v);
            }
        }
    }

    fn clamp_limits(&mut self) {
        self.limits.rate_limit_calls = self
            .limits
            .rate_limit_calls
            .clamp(RATE_LIMIT_MIN, RATE_LIMIT_MAX);
        self.limits.rate_limit_window_minutes = self.limits.rate_limit_window_minutes.max(1);
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.general.models.is_empty() {
            return Err(anyhow::anyhow!("general.models must not be empty"));
        }
        if self
            .general
            .models
            .iter()
            .any(|m| m.trim().is_empty())
        {
            return Err(anyhow::anyhow!("general.models entries must not be blank"));
        }
        Ok(())
    }

    pub fn policy(&self) -> Policy {
        Policy {
            auto_run: self.policy.auto_run,
            confirm_risky: self.policy.confirm_risky,
            auto_fix: self.policy.auto_fix,
        }
    }

    pub fn api_key_for_model(&self, model: &str) -> Option<String> {
        match sp_llm::detect_provider(model) {
            sp_llm::Provider::Anthropic => self
                .keys
                .anthropic_api_key
                .clone()
                .filter(|s| !s.is_empty()),
            sp_llm::Provider::OpenAI => {
                self.keys.openai_api_key.clone().filter(|s| !s.is_empty())
            }
        }
    }
}

pub fn default_config_path() -> PathBuf {
    config_root().join("config.toml")
}

pub fn default_usage_path() -> PathBuf {
    config_root().join("usage.json")
}

fn config_root() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".shellpilot")
}

/// Usage file lives next to whatever config file is in use.
pub fn usage_path_for(config_path: Option<&Path>) -> PathBuf {
    match config_path.and_then(Path::parent) {
        Some(dir) => dir.join("usage.json"),
        None => default_usage_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let cfg = AppConfig::default();
        assert!(!cfg.policy.auto_run);
        assert!(cfg.policy.confirm_risky);
        assert!(cfg.policy.auto_fix);
        assert!(cfg.general.enabled);
        assert_eq!(cfg.limits.rate_limit_calls, 60);
    }

    #[test]
    fn limits_are_clamped() {
        let mut cfg = AppConfig::default();
        cfg.limits.rate_limit_calls = 5000;
        cfg.limits.rate_limit_window_minutes = 0;
        cfg.clamp_limits();
        assert_eq!(cfg.limits.rate_limit_calls, RATE_LIMIT_MAX);
        assert_eq!(cfg.limits.rate_limit_window_minutes, 1);

        cfg.limits.rate_limit_calls = 1;
        cfg.clamp_limits();
        assert_eq!(cfg.limits.rate_limit_calls, RATE_LIMIT_MIN);
    }

    #[test]
    fn key_routing_follows_provider() {
        let mut cfg = AppConfig::default();
        cfg.keys.openai_api_key = Some("sk-openai".to_string());
        cfg.keys.anthropic_api_key = Some("sk-ant".to_string());
        assert_eq!(
            cfg.api_key_for_model("gpt-4o-mini").as_deref(),
            Some("sk-openai")
        );
        assert_eq!(
            cfg.api_key_for_model("claude-3-5-haiku-latest").as_deref(),
            Some("sk-ant")
        );
    }

    #[test]
    fn empty_model_list_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.general.models.clear();
        assert!(cfg.validate().is_err());
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = AppConfig::load(Some(&path)).await.unwrap();
        assert!(cfg.general.enabled);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.general.enabled = false;
        cfg.policy.auto_run = true;
        cfg.safety.extra_risky = vec![r"docker\s+rm".to_string()];
        cfg.save(&path).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let loaded: AppConfig = toml::from_str(&contents).unwrap();
        assert!(!loaded.general.enabled);
        assert!(loaded.policy.auto_run);
        assert_eq!(loaded.safety.extra_risky.len(), 1);
    }

    #[test]
    fn usage_path_sits_next_to_config() {
        let path = Path::new("/tmp/sp-test/config.toml");
        assert_eq!(
            usage_path_for(Some(path)),
            Path::new("/tmp/sp-test/usage.json")
        );
    }
}
