use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::git::DEFAULT_BRANCH;
use crate::types::CommitAuthor;

const DEFAULT_AUTHOR_NAME: &str = "OCD User";
const DEFAULT_AUTHOR_EMAIL: &str = "user@ocd.local";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PORT environment variable")]
    InvalidPort,
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3030)
    pub port: u16,
    /// Database file path (default: ./ssot.db)
    pub database_path: PathBuf,
    /// Branch pushed by git sync (default: main)
    pub git_branch: String,
    /// Commit author used when the session carries no name or email
    pub fallback_author: CommitAuthor,
    /// Session token created at startup for local clients
    pub bootstrap: Option<BootstrapSession>,
}

#[derive(Debug, Clone)]
pub struct BootstrapSession {
    pub token: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let host = var("HOST", "0.0.0.0");
        let port = var("PORT", "3030")
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;
        let database_path = PathBuf::from(var("DATABASE_PATH", "./ssot.db"));
        let git_branch = var("SSOT_GIT_BRANCH", DEFAULT_BRANCH);
        let fallback_author = CommitAuthor::new(
            var("SSOT_FALLBACK_AUTHOR_NAME", DEFAULT_AUTHOR_NAME),
            var("SSOT_FALLBACK_AUTHOR_EMAIL", DEFAULT_AUTHOR_EMAIL),
        );

        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let bootstrap = optional("SSOT_BOOTSTRAP_TOKEN").map(|token| BootstrapSession {
            token,
            name: optional("SSOT_BOOTSTRAP_USER_NAME"),
            email: optional("SSOT_BOOTSTRAP_USER_EMAIL"),
        });

        Ok(Config {
            host,
            port,
            database_path,
            git_branch,
            fallback_author,
            bootstrap,
        })
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Terminal browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    /// Repository synced from the git sync dialog
    pub repository_path: PathBuf,
    pub log_file: PathBuf,
}

impl BrowserConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        BrowserConfig {
            api_url: optional("SSOT_API_URL")
                .unwrap_or_else(|| "http://127.0.0.1:3030".to_string())
                .trim_end_matches('/')
                .to_string(),
            api_token: optional("SSOT_API_TOKEN"),
            repository_path: PathBuf::from(
                optional("SSOT_REPOSITORY_PATH").unwrap_or_else(|| ".".to_string()),
            ),
            log_file: PathBuf::from(
                optional("SSOT_LOG_FILE").unwrap_or_else(|| "ssot-browser.log".to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_addr(), "0.0.0.0:3030");
        assert_eq!(config.database_path, PathBuf::from("./ssot.db"));
        assert_eq!(config.git_branch, "main");
        assert_eq!(
            config.fallback_author,
            CommitAuthor::new("OCD User", "user@ocd.local")
        );
        assert!(config.bootstrap.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("SSOT_GIT_BRANCH", "trunk"),
            ("SSOT_FALLBACK_AUTHOR_NAME", "Robot"),
            ("SSOT_BOOTSTRAP_TOKEN", "local-token"),
            ("SSOT_BOOTSTRAP_USER_EMAIL", "me@example.com"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.git_branch, "trunk");
        assert_eq!(config.fallback_author.name, "Robot");
        assert_eq!(config.fallback_author.email, "user@ocd.local");
        let bootstrap = config.bootstrap.unwrap();
        assert_eq!(bootstrap.token, "local-token");
        assert_eq!(bootstrap.name, None);
        assert_eq!(bootstrap.email.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort);
    }

    #[test]
    fn browser_trims_trailing_slash() {
        let config = BrowserConfig::from_lookup(lookup(&[("SSOT_API_URL", "http://host:1/")]));
        assert_eq!(config.api_url, "http://host:1");
        assert_eq!(config.repository_path, PathBuf::from("."));
        assert!(config.api_token.is_none());
    }
}
