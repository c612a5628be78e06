//! Configuration loading and management.
//!
//! Loads configuration from embedded config.toml (or a user config file) with
//! environment variable overrides.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Embedded configuration file content.
const CONFIG_TOML: &str = include_str!("../config.toml");

/// User configuration file name.
const CONFIG_FILE: &str = "config.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub oauth: OAuthConfig,
    pub api: ApiConfig,
    pub http: HttpConfig,
    pub token: TokenConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub tenant: String,
    #[serde(default)]
    pub client_secret: String,
    pub authority_host: String,
    pub scopes: Vec<String>,
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("tenant", &self.tenant)
            .field("client_secret", &"<redacted>")
            .field("authority_host", &self.authority_host)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub graph_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub refresh_before_expiry_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration with environment variable overrides.
    ///
    /// A `config.toml` in the platform config directory takes the place of the
    /// embedded defaults when it exists.
    pub fn load() -> Result<Self> {
        let mut config = match user_config_path().filter(|p| p.exists()) {
            Some(path) => {
                debug!("Loading configuration from {:?}", path);
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => Self::parse(CONFIG_TOML).context("Failed to parse embedded config.toml")?,
        };

        config.apply_env_overrides();

        // Validate required fields
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document without overrides or validation.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(client_id) = env::var("AZURE_CLIENT_ID") {
            self.oauth.client_id = client_id;
        }

        if let Ok(tenant) = env::var("AZURE_TENANT_ID") {
            self.oauth.tenant = tenant;
        }

        if let Ok(secret) = env::var("AZURE_CLIENT_SECRET") {
            self.oauth.client_secret = secret;
        }

        if let Ok(base_url) = env::var("GRAPH_BASE_URL") {
            self.api.graph_base_url = base_url;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            self.logging.level = log_level;
        }
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.oauth.client_id.is_empty() || self.oauth.client_id == "YOUR_AZURE_AD_CLIENT_ID" {
            anyhow::bail!(
                "Azure AD client_id not configured. Set AZURE_CLIENT_ID environment variable \
                 or update config.toml"
            );
        }

        if self.oauth.tenant.is_empty() || self.oauth.tenant == "YOUR_TENANT_ID" {
            anyhow::bail!(
                "Azure AD tenant not configured. Set AZURE_TENANT_ID environment variable \
                 or update config.toml"
            );
        }

        if self.oauth.client_secret.is_empty() {
            anyhow::bail!(
                "Azure AD client secret not configured. Set AZURE_CLIENT_SECRET environment \
                 variable"
            );
        }

        url::Url::parse(&self.api.graph_base_url)
            .with_context(|| format!("Invalid graph_base_url: {}", self.api.graph_base_url))?;

        Ok(())
    }

    /// Authority URL for the tenant.
    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.oauth.authority_host.trim_end_matches('/'),
            self.oauth.tenant
        )
    }

    /// Token endpoint for the client credentials grant.
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority())
    }
}

/// Path of the optional user configuration file.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("io", "graphy", "graphy").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
pub(crate) fn test_config(server_uri: &str) -> Config {
    Config {
        app: AppConfig {
            name: "graphy".into(),
            version: "0.1.0".into(),
        },
        oauth: OAuthConfig {
            client_id: "test-client".into(),
            tenant: "test-tenant".into(),
            client_secret: "test-secret".into(),
            authority_host: server_uri.into(),
            scopes: vec!["https://graph.microsoft.com/.default".into()],
        },
        api: ApiConfig {
            graph_base_url: format!("{}/v1.0", server_uri),
        },
        http: HttpConfig {
            timeout_seconds: 5,
            connect_timeout_seconds: 5,
        },
        token: TokenConfig {
            refresh_before_expiry_seconds: 300,
        },
        logging: LoggingConfig {
            level: "debug".into(),
        },
    }
}
