use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_PREFIX: &str = "TELESCOPE_MCP";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Routes served by the HTTP front door besides the metrics endpoint
const RESERVED_PATHS: &[&str] = &["/health", "/ready", "/manifest.json", "/mcp"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mcp: McpConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub retention: RetentionSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_seconds: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct McpConfig {
    #[serde(default = "default_mcp_name")]
    pub name: String,
    #[serde(default = "default_mcp_description")]
    pub description: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            name: default_mcp_name(),
            description: default_mcp_description(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiKeyConfig {
    pub key: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_retention_hours")]
    pub hours: u64,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            hours: default_retention_hours(),
            check_interval_seconds: default_check_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_metrics_endpoint(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_database_url() -> String {
    "sqlite:./data/telescope.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    30
}

fn default_mcp_name() -> String {
    "telescope-mcp".to_string()
}

fn default_mcp_description() -> String {
    "Recorded application debugging entries: requests, queries, logs, exceptions and more".to_string()
}

fn default_true() -> bool {
    true
}

fn default_retention_hours() -> u64 {
    24
}

fn default_check_interval() -> u64 {
    3600
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

/// Load configuration from an optional TOML file layered with
/// `TELESCOPE_MCP__SECTION__KEY` environment variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("server.port must be non-zero");
    }

    if !matches!(cfg.server.log_format.as_str(), "text" | "json") {
        anyhow::bail!(
            "server.log_format must be 'text' or 'json', got '{}'",
            cfg.server.log_format
        );
    }

    if cfg.database.max_connections == 0 {
        anyhow::bail!("database.max_connections must be at least 1");
    }

    if cfg.retention.hours == 0 {
        anyhow::bail!("retention.hours must be at least 1");
    }

    if !cfg.metrics.endpoint.starts_with('/') {
        anyhow::bail!("metrics.endpoint must start with '/'");
    }
    if RESERVED_PATHS.contains(&cfg.metrics.endpoint.as_str()) || cfg.metrics.endpoint.starts_with("/tools/") {
        anyhow::bail!("metrics.endpoint '{}' collides with a built-in route", cfg.metrics.endpoint);
    }

    for key in &cfg.auth.api_keys {
        if key.name.is_empty() {
            anyhow::bail!("API key name cannot be empty");
        }
        if key.key.is_empty() {
            anyhow::bail!("API key '{}' has an empty key", key.name);
        }
    }

    if cfg.auth.enabled && !cfg.auth.api_keys.iter().any(|k| k.enabled) {
        anyhow::bail!("Authentication is enabled but no enabled API key is configured");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_config() -> Config {
        Config {
            auth: AuthConfig {
                enabled: true,
                api_keys: vec![ApiKeyConfig {
                    key: "test-key".to_string(),
                    name: "test".to_string(),
                    enabled: true,
                }],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();

        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8787);
        assert_eq!(cfg.database.max_connections, 5);
        assert!(!cfg.auth.enabled);
        assert!(!cfg.retention.enabled);
        assert_eq!(cfg.retention.hours, 24);
        assert!(cfg.metrics.enabled);
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_validate_config_requires_enabled_key_with_auth() {
        let mut cfg = create_test_config();
        assert!(validate_config(&cfg).is_ok());

        cfg.auth.api_keys[0].enabled = false;
        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no enabled API key"));
    }

    #[test]
    fn test_validate_config_rejects_bad_values() {
        let mut cfg = create_test_config();
        cfg.server.log_format = "yaml".to_string();
        assert!(validate_config(&cfg).is_err());

        let mut cfg = create_test_config();
        cfg.retention.hours = 0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = create_test_config();
        cfg.auth.api_keys[0].name.clear();
        assert!(validate_config(&cfg)
            .unwrap_err()
            .to_string()
            .contains("API key name cannot be empty"));

        let mut cfg = create_test_config();
        cfg.metrics.endpoint = "/mcp".to_string();
        assert!(validate_config(&cfg).unwrap_err().to_string().contains("collides"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000
log_format = "json"

[database]
url = "sqlite::memory:"

[auth]
enabled = true

[[auth.api_keys]]
key = "secret"
name = "assistant"
"#
        )
        .unwrap();

        let cfg = load_config(file.path()).unwrap();

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.log_format, "json");
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert!(cfg.auth.enabled);
        assert!(cfg.auth.api_keys[0].enabled);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.mcp.name, "telescope-mcp");
    }
}
