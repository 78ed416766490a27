use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::health::HealthPolicy;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolverConfig {
    /// Data API v3 key. Without one the official-API cascade steps fail
    /// as unavailable and resolution leans on the free sources.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_instances")]
    pub invidious_instances: Vec<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_exclusion_secs")]
    pub exclusion_secs: u64,
}

impl HealthConfig {
    pub fn policy(&self) -> HealthPolicy {
        HealthPolicy {
            failure_threshold: self.failure_threshold,
            exclusion: Duration::from_secs(self.exclusion_secs),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            exclusion_secs: default_exclusion_secs(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            invidious_instances: default_instances(),
            http_timeout_secs: default_http_timeout_secs(),
            health: HealthConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config_str = std::fs::read_to_string(path)?;
        let config: ResolverConfig = toml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn default_instances() -> Vec<String> {
    [
        "https://yewtu.be",
        "https://inv.nadeko.net",
        "https://invidious.nerdvpn.de",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_failure_threshold() -> u32 {
    2
}

fn default_exclusion_secs() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gets_defaults() {
        let config: ResolverConfig = toml::from_str("").unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.health.failure_threshold, 2);
        assert!(!config.invidious_instances.is_empty());
    }

    #[test]
    fn test_partial_config_overrides() {
        let config: ResolverConfig = toml::from_str(
            r#"
            api_key = "secret"
            invidious_instances = ["https://inv.example.org"]

            [health]
            failure_threshold = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.invidious_instances, vec!["https://inv.example.org"]);
        assert_eq!(config.health.failure_threshold, 5);
        assert_eq!(config.health.exclusion_secs, 300);
    }
}
