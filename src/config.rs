//! Configuration for sitegen.
//!
//! Settings are layered: `sitegen.toml` → environment → CLI flags.
//! Every section is optional; a missing file means all defaults.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//! dev_mode = false
//! cors_origins = ["http://localhost:3000"]
//!
//! [agent]
//! claude_cmd = "claude"
//! model = "claude-sonnet-4-5-20250929"
//! timeout_secs = 600
//!
//! [workflow]
//! output_dir = "/tmp/generated-sites"
//! max_validation_attempts = 3
//!
//! [github]
//! username = "acme"
//! email = "dev@acme.test"
//! visibility = "public"
//!
//! [logging]
//! file = "sitegen.log"
//! ```
//!
//! Credentials are never read from the file. They come from
//! `ANTHROPIC_API_KEY`, `GITHUB_TOKEN` and `VERCEL_TOKEN`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "sitegen.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Permissive CORS for local front-end development.
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev_mode: false,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_claude_cmd")]
    pub claude_cmd: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Upper bound for a single agent session.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_claude_cmd() -> String {
    "claude".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            claude_cmd: default_claude_cmd(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AgentSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Parent of every job's site directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_validation_attempts")]
    pub max_validation_attempts: u32,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("/tmp/generated-sites")
}

fn default_max_validation_attempts() -> u32 {
    3
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_validation_attempts: default_max_validation_attempts(),
        }
    }
}

/// Repository settings handed to the publish phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

fn default_visibility() -> String {
    "public".to_string()
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            username: None,
            email: None,
            visibility: default_visibility(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Also write logs to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Secrets taken from the environment only.
#[derive(Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub github_token: Option<String>,
    pub vercel_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("github_token", &redact(&self.github_token))
            .field("vercel_token", &redact(&self.vercel_token))
            .finish()
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "<set>" } else { "<unset>" }
}

/// The complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub workflow: WorkflowSettings,
    #[serde(default)]
    pub github: GithubSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Settings {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse sitegen.toml")
    }

    /// Load from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// File, then process environment.
    pub fn resolve(path: &Path) -> Result<Self> {
        let mut settings = Self::load_or_default(path)?;
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Save configuration to a TOML file. Credentials are never written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize sitegen.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides and read credentials through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(cmd) = lookup("CLAUDE_CMD") {
            self.agent.claude_cmd = cmd;
        }
        if let Some(model) = lookup("SITEGEN_MODEL") {
            self.agent.model = model;
        }
        if let Some(dir) = lookup("SITEGEN_OUTPUT_DIR") {
            self.workflow.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("SITEGEN_MAX_VALIDATION_ATTEMPTS") {
            self.workflow.max_validation_attempts = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid SITEGEN_MAX_VALIDATION_ATTEMPTS '{}'", raw))?;
        }
        if let Some(raw) = lookup("SITEGEN_PORT") {
            self.server.port = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid SITEGEN_PORT '{}'", raw))?;
        }

        self.credentials = Credentials {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY"),
            github_token: lookup("GITHUB_TOKEN").or_else(|| lookup("GH_TOKEN")),
            vercel_token: lookup("VERCEL_TOKEN"),
        };
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.workflow.max_validation_attempts == 0 {
            warnings.push(
                "max_validation_attempts is 0: validation will still run once".to_string(),
            );
        }
        if self.agent.timeout_secs == 0 {
            warnings.push("timeout_secs is 0: every agent session will time out".to_string());
        }
        if !matches!(self.github.visibility.as_str(), "public" | "private") {
            warnings.push(format!(
                "Invalid github visibility '{}': should be 'public' or 'private'",
                self.github.visibility
            ));
        }
        if self.credentials.anthropic_api_key.is_none() {
            warnings.push("ANTHROPIC_API_KEY is not set: prefill is unavailable".to_string());
        }
        if self.credentials.github_token.is_none() {
            warnings.push(
                "GITHUB_TOKEN is not set: publishing relies on an existing gh login".to_string(),
            );
        }
        if self.credentials.vercel_token.is_none() {
            warnings.push(
                "VERCEL_TOKEN is not set: deployment relies on an existing vercel login"
                    .to_string(),
            );
        }

        warnings
    }

    /// At least one validation always runs.
    pub fn max_validation_attempts(&self) -> u32 {
        self.workflow.max_validation_attempts.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.agent.claude_cmd, "claude");
        assert_eq!(settings.agent.model, "claude-sonnet-4-5-20250929");
        assert_eq!(settings.agent.timeout(), Duration::from_secs(600));
        assert_eq!(settings.workflow.output_dir, PathBuf::from("/tmp/generated-sites"));
        assert_eq!(settings.workflow.max_validation_attempts, 3);
        assert_eq!(settings.github.visibility, "public");
    }

    #[test]
    fn test_parse_partial_file() {
        let settings = Settings::parse(
            r#"
            [agent]
            timeout_secs = 30

            [workflow]
            max_validation_attempts = 5

            [github]
            username = "acme"
            "#,
        )
        .unwrap();
        assert_eq!(settings.agent.timeout_secs, 30);
        assert_eq!(settings.agent.claude_cmd, "claude");
        assert_eq!(settings.workflow.max_validation_attempts, 5);
        assert_eq!(settings.github.username.as_deref(), Some("acme"));
        assert_eq!(settings.github.visibility, "public");
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(Settings::parse("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut settings = Settings::parse("[agent]\nclaude_cmd = \"from-file\"").unwrap();
        settings
            .apply_env(env(&[
                ("CLAUDE_CMD", "/opt/claude"),
                ("SITEGEN_OUTPUT_DIR", "/srv/sites"),
                ("SITEGEN_MAX_VALIDATION_ATTEMPTS", "2"),
                ("SITEGEN_PORT", "9000"),
            ]))
            .unwrap();
        assert_eq!(settings.agent.claude_cmd, "/opt/claude");
        assert_eq!(settings.workflow.output_dir, PathBuf::from("/srv/sites"));
        assert_eq!(settings.workflow.max_validation_attempts, 2);
        assert_eq!(settings.server.port, 9000);
    }

    #[test]
    fn test_invalid_env_number_is_error() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(env(&[("SITEGEN_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(err.to_string().contains("SITEGEN_PORT"));
    }

    #[test]
    fn test_credentials_from_env_only() {
        let mut settings = Settings::default();
        settings
            .apply_env(env(&[
                ("ANTHROPIC_API_KEY", "sk-ant-secret"),
                ("GH_TOKEN", "ghp_secret"),
                ("VERCEL_TOKEN", "  "),
            ]))
            .unwrap();
        assert_eq!(settings.credentials.anthropic_api_key.as_deref(), Some("sk-ant-secret"));
        assert_eq!(settings.credentials.github_token.as_deref(), Some("ghp_secret"));
        assert!(settings.credentials.vercel_token.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut settings = Settings::default();
        settings
            .apply_env(env(&[("ANTHROPIC_API_KEY", "sk-ant-secret")]))
            .unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn test_save_never_writes_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitegen.toml");
        let mut settings = Settings::default();
        settings
            .apply_env(env(&[("GITHUB_TOKEN", "ghp_secret")]))
            .unwrap();
        settings.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("ghp_secret"));
        let reloaded = Settings::load(&path).unwrap();
        assert_eq!(reloaded.server.port, 8000);
        assert!(reloaded.credentials.github_token.is_none());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn test_validate_warnings() {
        let mut settings = Settings::parse(
            "[workflow]\nmax_validation_attempts = 0\n[github]\nvisibility = \"secret\"",
        )
        .unwrap();
        settings
            .apply_env(env(&[
                ("ANTHROPIC_API_KEY", "a"),
                ("GITHUB_TOKEN", "b"),
                ("VERCEL_TOKEN", "c"),
            ]))
            .unwrap();
        let warnings = settings.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("max_validation_attempts"));
        assert!(warnings[1].contains("visibility"));
        assert_eq!(settings.max_validation_attempts(), 1);
    }

    #[test]
    fn test_validate_reports_missing_credentials() {
        let warnings = Settings::default().validate();
        assert_eq!(warnings.len(), 3);
    }
}
