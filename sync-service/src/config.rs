use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the local SQLite database file.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote service, without the `/rest/v1` suffix.
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Seconds between connectivity checks in the watch loop.
    #[serde(default = "default_probe_interval_secs")]
    pub interval_secs: u64,
    /// Per-probe request timeout.
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_probe_interval_secs() -> u64 {
    15
}
fn default_probe_timeout_ms() -> u64 {
    3000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_probe_interval_secs(),
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_pause_ms")]
    pub retry_pause_ms: u64,
    /// Pause before the first remote call of a drain, so a connection
    /// that just came up has settled.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_retry_pause_ms() -> u64 {
    500
}
fn default_settle_delay_ms() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_pause_ms: default_retry_pause_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("READER_CONFIG").unwrap_or_else(|_| "reader-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_documented_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [store]
            path = "wb-reader.db"

            [remote]
            base_url = "https://example.supabase.co"
            api_key = "anon-key"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.sync.max_attempts, 3);
        assert_eq!(cfg.sync.retry_pause_ms, 500);
        assert_eq!(cfg.sync.settle_delay_ms, 1000);
        assert_eq!(cfg.probe.interval_secs, 15);
    }
}
