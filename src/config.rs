//! Configuration management for the Notion MCP Server
//!
//! Handles environment variables, `.env` loading, and Notion API constants.

use std::path::Path;

use crate::error::{ConfigError, NotionMcpError, Result};

/// Environment variable holding the integration token
pub const API_KEY_VAR: &str = "NOTION_API_KEY";

/// Environment variable overriding the API root
pub const BASE_URL_VAR: &str = "NOTION_API_BASE_URL";

/// Environment variable overriding the `Notion-Version` header
pub const VERSION_VAR: &str = "NOTION_VERSION";

/// Configuration for the Notion MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Integration token sent as a bearer credential
    pub api_key: String,

    /// API root, without trailing slash
    pub base_url: String,

    /// Value of the `Notion-Version` header
    pub notion_version: String,
}

impl Config {
    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                NotionMcpError::Config(ConfigError::MissingEnvVar {
                    var: API_KEY_VAR.to_string(),
                })
            })?;

        let base_url = std::env::var(BASE_URL_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| notion::API_BASE_URL.to_string());

        let notion_version = std::env::var(VERSION_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| notion::API_VERSION.to_string());

        Self::new(api_key, base_url, notion_version)
    }

    /// Build a configuration from explicit values
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        notion_version: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(NotionMcpError::Config(ConfigError::InvalidConfig {
                message: format!("{} must be an http(s) URL, got '{}'", BASE_URL_VAR, base_url),
            }));
        }

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            notion_version: notion_version.into(),
        })
    }

    /// Load variables from a dotenv file into the process environment.
    ///
    /// With an explicit path the file must exist. Without one, `.env` in the
    /// working directory is loaded if present. Variables already set win.
    pub fn load_env_file(path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => dotenvy::from_path(path).map_err(|e| {
                NotionMcpError::Config(ConfigError::EnvFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }),
            None => match dotenvy::dotenv() {
                Ok(path) => {
                    tracing::debug!("Loaded environment from {}", path.display());
                    Ok(())
                }
                Err(e) if e.not_found() => Ok(()),
                Err(e) => Err(NotionMcpError::Config(ConfigError::EnvFile {
                    path: ".env".to_string(),
                    message: e.to_string(),
                })),
            },
        }
    }
}

/// Notion API constants
pub mod notion {
    /// Base URL for the Notion API
    pub const API_BASE_URL: &str = "https://api.notion.com/v1";

    /// API version sent in the `Notion-Version` header
    pub const API_VERSION: &str = "2022-06-28";

    /// Page size used when the caller does not give one
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    /// Icon glyph used when an emoji icon is requested without one
    pub const DEFAULT_EMOJI: &str = "📄";
}
