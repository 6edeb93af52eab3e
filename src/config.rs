//! Workflow configuration parser
//!
//! Parses `forgeflow.toml` into API settings and the fixed request bodies
//! for the repository, issue and comment steps.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::remote::{Credentials, DEFAULT_USER_AGENT};

/// API connection settings
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://api.github.com/`
    pub base_url: String,
    /// Personal access token. Left empty, the token is read from `token_env`.
    #[serde(default)]
    pub token: String,
    /// Environment variable holding the token (default: `GITHUB_TOKEN`)
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// `User-Agent` override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Whole-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &token)
            .field("token_env", &self.token_env)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Body of the repository-creation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Repository name
    pub name: String,
    /// Repository description
    #[serde(default)]
    pub description: String,
    /// Whether the repository is private
    #[serde(default)]
    pub private: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: "New Repository".to_string(),
            description: "My new repository created via API".to_string(),
            private: false,
        }
    }
}

/// Body of the issue-creation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueConfig {
    /// Issue title
    pub title: String,
    /// Issue body
    #[serde(default)]
    pub body: String,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            title: "New Issue from API".to_string(),
            body: "This is an issue created via API.".to_string(),
        }
    }
}

/// Body of the comment request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentConfig {
    /// Comment text
    pub body: String,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            body: "This is a comment added via API.".to_string(),
        }
    }
}

/// Top-level configuration parsed from `forgeflow.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForgeConfig {
    /// API connection settings
    pub api: ApiConfig,
    /// Repository to create
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// Issue to open in the new repository
    #[serde(default)]
    pub issue: IssueConfig,
    /// Comment to add to the new issue
    #[serde(default)]
    pub comment: CommentConfig,
}

impl ForgeConfig {
    /// Parse a `forgeflow.toml` file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse `forgeflow.toml` content from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse forgeflow.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve credentials, reading the token from the process environment
    /// when the file leaves it empty.
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Resolve credentials with a custom environment lookup
    pub fn credentials_with<F>(&self, lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = if self.api.token.trim().is_empty() {
            lookup(&self.api.token_env).unwrap_or_default()
        } else {
            self.api.token.clone()
        };

        let token = token.trim();
        if token.is_empty() {
            bail!(
                "No API token: set 'token' under [api] or export {}",
                self.api.token_env
            );
        }

        Ok(Credentials::new(token, &self.api.base_url))
    }

    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// `User-Agent` to send, falling back to the crate default
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.api.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validate_base_url(&self.api.base_url)?;

        if self.api.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }

        if self.api.token.trim().is_empty() && self.api.token_env.trim().is_empty() {
            bail!("Either 'token' or 'token_env' must be set under [api]");
        }

        if let Some(agent) = &self.api.user_agent {
            if agent.trim().is_empty() {
                bail!("user_agent cannot be empty when set");
            }
        }

        if self.repository.name.trim().is_empty() {
            bail!("Repository name cannot be empty");
        }

        if self.issue.title.trim().is_empty() {
            bail!("Issue title cannot be empty");
        }

        if self.comment.body.trim().is_empty() {
            bail!("Comment body cannot be empty");
        }

        Ok(())
    }
}

/// The base URL must be an absolute http(s) URL.
fn validate_base_url(base_url: &str) -> Result<()> {
    let url = Url::parse(base_url.trim())
        .with_context(|| format!("Invalid base_url '{base_url}'"))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("Invalid base_url '{base_url}': scheme must be http or https");
    }

    if url.query().is_some() || url.fragment().is_some() {
        bail!("Invalid base_url '{base_url}': query strings and fragments are not allowed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
[api]
base_url = "https://ghe.example.com/api/v3"
token = "ghp_filetoken"
timeout_secs = 10

[repository]
name = "demo"
description = "Demo repository"
private = true

[issue]
title = "First issue"
body = "Tracking work"

[comment]
body = "Looking into it"
"#;

    const MINIMAL_CONFIG: &str = r#"
[api]
base_url = "https://api.github.com"
"#;

    /// Minimal config followed by extra TOML
    fn with_api(extra: &str) -> String {
        format!("{MINIMAL_CONFIG}{extra}")
    }

    #[test]
    fn test_parse_valid_config() {
        let config = ForgeConfig::parse(VALID_CONFIG).unwrap();

        assert_eq!(config.api.base_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.repository.name, "demo");
        assert!(config.repository.private);
        assert_eq!(config.issue.title, "First issue");
        assert_eq!(config.comment.body, "Looking into it");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = ForgeConfig::parse(MINIMAL_CONFIG).unwrap();

        assert_eq!(config.api.base_url, "https://api.github.com");
        assert_eq!(config.api.token_env, "GITHUB_TOKEN");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.repository.name, "New Repository");
        assert_eq!(
            config.repository.description,
            "My new repository created via API"
        );
        assert!(!config.repository.private);
        assert_eq!(config.issue.title, "New Issue from API");
        assert_eq!(config.issue.body, "This is an issue created via API.");
        assert_eq!(config.comment.body, "This is a comment added via API.");
    }

    #[test]
    fn test_reject_missing_api_section() {
        let err = ForgeConfig::parse(
            r#"
[repository]
name = "x"
"#,
        )
        .unwrap_err();
        let msg = format!("{err:?}");
        assert!(msg.contains("api"), "Expected missing [api] error, got: {msg}");
    }

    #[test]
    fn test_reject_missing_base_url() {
        let err = ForgeConfig::parse(
            r#"
[api]
token = "ghp_filetoken"
"#,
        )
        .unwrap_err();
        let msg = format!("{err:?}");
        assert!(
            msg.contains("base_url"),
            "Expected missing base_url error, got: {msg}"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ForgeConfig::parse(VALID_CONFIG).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("ghp_filetoken"), "token leaked: {debug}");
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("https://ghe.example.com/api/v3"));
    }

    #[test]
    fn test_credentials_normalize_base_url() {
        let config = ForgeConfig::parse(VALID_CONFIG).unwrap();
        let creds = config.credentials_with(|_| None).unwrap();

        assert_eq!(creds.token(), "ghp_filetoken");
        assert_eq!(creds.base_url(), "https://ghe.example.com/api/v3/");
    }

    #[test]
    fn test_token_falls_back_to_environment() {
        let config = ForgeConfig::parse(
            r#"
[api]
base_url = "https://api.github.com/"
token_env = "FORGE_TOKEN"
"#,
        )
        .unwrap();
        let creds = config
            .credentials_with(|name| (name == "FORGE_TOKEN").then(|| "ghp_envtoken".to_string()))
            .unwrap();

        assert_eq!(creds.token(), "ghp_envtoken");
    }

    #[test]
    fn test_file_token_wins_over_environment() {
        let config = ForgeConfig::parse(VALID_CONFIG).unwrap();
        let creds = config
            .credentials_with(|_| Some("ghp_envtoken".to_string()))
            .unwrap();

        assert_eq!(creds.token(), "ghp_filetoken");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let config = ForgeConfig::parse(MINIMAL_CONFIG).unwrap();
        let err = config.credentials_with(|_| None).unwrap_err();
        assert!(
            err.to_string().contains("GITHUB_TOKEN"),
            "Expected env var name in error, got: {err}"
        );
    }

    #[test]
    fn test_whitespace_token_is_an_error() {
        let config = ForgeConfig::parse(MINIMAL_CONFIG).unwrap();
        assert!(config
            .credentials_with(|_| Some("   ".to_string()))
            .is_err());
    }

    #[test]
    fn test_reject_non_http_base_url() {
        let err = ForgeConfig::parse(
            r#"
[api]
base_url = "ftp://example.com/"
"#,
        )
        .unwrap_err();
        assert!(
            err.to_string().contains("scheme"),
            "Expected scheme error, got: {err}"
        );
    }

    #[test]
    fn test_reject_relative_base_url() {
        let err = ForgeConfig::parse(
            r#"
[api]
base_url = "api/v3"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid base_url"));
    }

    #[test]
    fn test_reject_base_url_with_query() {
        let err = ForgeConfig::parse(
            r#"
[api]
base_url = "https://api.github.com/?per_page=1"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_reject_zero_timeout() {
        let err = ForgeConfig::parse(
            r#"
[api]
base_url = "https://api.github.com/"
timeout_secs = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_reject_empty_repository_name() {
        let err = ForgeConfig::parse(&with_api(
            r#"
[repository]
name = "  "
"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("Repository name"));
    }

    #[test]
    fn test_reject_empty_issue_title() {
        let err = ForgeConfig::parse(&with_api(
            r#"
[issue]
title = ""
"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("Issue title"));
    }

    #[test]
    fn test_reject_missing_required_section_field() {
        let err = ForgeConfig::parse(&with_api(
            r#"
[comment]
"#,
        ))
        .unwrap_err();
        let msg = format!("{err:?}");
        assert!(
            msg.contains("missing field") || msg.contains("Failed to parse"),
            "Expected parse error for missing fields, got: {msg}"
        );
    }

    #[test]
    fn test_reject_invalid_toml() {
        let err = ForgeConfig::parse("not valid toml {{{").unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_user_agent_default_and_override() {
        let config = ForgeConfig::parse(MINIMAL_CONFIG).unwrap();
        assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);

        let config = ForgeConfig::parse(
            r#"
[api]
base_url = "https://api.github.com/"
user_agent = "acme-bot/2.0"
"#,
        )
        .unwrap();
        assert_eq!(config.user_agent(), "acme-bot/2.0");
    }

    #[test]
    fn test_timeout_duration() {
        let config = ForgeConfig::parse(VALID_CONFIG).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = ForgeConfig::from_path("/nonexistent/forgeflow.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_from_path_valid_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("forgeflow.toml");
        std::fs::write(&config_path, VALID_CONFIG).unwrap();

        let config = ForgeConfig::from_path(&config_path).unwrap();
        assert_eq!(config.repository.name, "demo");
    }

    #[test]
    fn test_multiline_issue_body() {
        let config = ForgeConfig::parse(&with_api(
            r#"
[issue]
title = "Multi"
body = """
Line one.
Line two.
"""
"#,
        ))
        .unwrap();
        assert!(config.issue.body.contains("Line one."));
        assert!(config.issue.body.contains("Line two."));
    }
}
