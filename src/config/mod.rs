//! Configuration management

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection settings for the real-time media control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// API key identifying this deployment towards the control plane;
    /// also the `iss` claim of every minted access token.
    pub api_key: String,
    /// Hex-encoded HMAC-SHA256 signing secret for access tokens.
    pub signing_secret: String,
}

/// Static bearer tokens for development and tests. Production deployments
/// verify bearers against the external identity provider instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub static_tokens: Vec<StaticToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub organization_id: Uuid,
    pub user_id: Uuid,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            api_key: "vocalis-dev".to_string(),
            // Development-only secret; override in deployment config.
            signing_secret:
                "8344edc12f4a1bb5ae48a3a102253a3fd0dee9f5b3a5c8d27e9d1b64c0ffee00"
                    .to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the TOML file named by `VOCALIS_CONFIG`,
    /// falling back to defaults when the variable is unset.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("VOCALIS_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)?;
                Ok(toml::from_str(&raw)?)
            }
            Err(_) => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert!(!config.media.api_key.is_empty());
        assert!(config.auth.static_tokens.is_empty());
    }

    #[test]
    fn test_config_from_toml() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [media]
            api_key = "prod-key"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.media.api_key, "prod-key");
        // Unset sections fall back to defaults
        assert!(!config.media.signing_secret.is_empty());
    }
}
