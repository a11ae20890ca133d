use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Store credit admin service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Admin API key (required, every admin route checks it)
    #[serde(default)]
    pub admin_api_key: Option<String>,

    /// Comma-separated list of origins allowed to call the admin API
    /// e.g. "http://localhost:7000,https://admin.example.com"
    /// Entries must be exact origins; `*` and `/pattern/` entries are ignored
    #[serde(default = "default_admin_cors")]
    pub admin_cors: String,

    /// Data file holding customers, regions and store credits (optional)
    /// When not set, all data lives in memory only
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,

    /// Page size used when a list request has no `limit`
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Largest `limit` a list request may ask for
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Config file path (runtime metadata, not written to JSON)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_admin_cors() -> String {
    "http://localhost:7000,http://localhost:7001".to_string()
}

fn default_limit() -> usize {
    50
}

fn default_max_limit() -> usize {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_api_key: None,
            admin_cors: default_admin_cors(),
            data_path: None,
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            config_path: None,
        }
    }
}

impl Config {
    /// Get default config file path
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// Admin API key, treating blank strings as not configured
    pub fn effective_admin_api_key(&self) -> Option<&str> {
        self.admin_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // Config file doesn't exist, return default config
            let mut config = Self::default();
            config.config_path = Some(path.to_path_buf());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Get config file path (if available)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_limit == 0 {
            anyhow::bail!("defaultLimit must be greater than 0");
        }
        if self.max_limit < self.default_limit {
            anyhow::bail!(
                "maxLimit ({}) must not be smaller than defaultLimit ({})",
                self.max_limit,
                self.default_limit
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_limit, 50);
        assert_eq!(config.max_limit, 1000);
        assert!(config.admin_api_key.is_none());
        assert_eq!(config.config_path(), Some(path.as_path()));
    }

    #[test]
    fn test_load_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"port": 9100, "adminApiKey": "secret", "adminCors": "https://admin.test", "defaultLimit": 20}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.effective_admin_api_key(), Some("secret"));
        assert_eq!(config.admin_cors, "https://admin.test");
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_blank_admin_key_is_not_configured() {
        let config = Config {
            admin_api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.effective_admin_api_key().is_none());
    }

    #[test]
    fn test_rejects_inconsistent_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"defaultLimit": 100, "maxLimit": 10}"#).unwrap();
        assert!(Config::load(&path).is_err());
    }
}
