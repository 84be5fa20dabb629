use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub slack: SlackConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub permissions: PermissionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            url_prefix: default_url_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlackConfig {
    #[serde(alias = "verification-token")]
    pub verification_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_response_url_pattern")]
    pub response_url_pattern: String,
    #[serde(default = "default_link_url_template")]
    pub link_url_template: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Some(default_database_url()),
            filename: None,
            max_connections: None,
        }
    }
}

impl DatabaseConfig {
    pub fn db_type(&self) -> DbType {
        let url = self.connection_string();
        if url.starts_with("sqlite://") || url.ends_with(".db") || url.ends_with(".sqlite") {
            DbType::Sqlite
        } else {
            DbType::Unsupported
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            String::new()
        }
    }

    pub fn sqlite_path(&self) -> Option<String> {
        if let DbType::Sqlite = self.db_type() {
            let url = self.connection_string();
            Some(url.strip_prefix("sqlite://").unwrap_or(&url).to_string())
        } else {
            None
        }
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(8).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Sqlite,
    Unsupported,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermissionConfig {
    #[serde(default = "default_allow_superuser")]
    pub allow_superuser: bool,
    #[serde(default)]
    pub sso: SsoRequirement,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            allow_superuser: default_allow_superuser(),
            sso: SsoRequirement::default(),
        }
    }
}

/// How organizations that enforce single sign-on treat chat-driven actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SsoRequirement {
    /// Membership alone is enough.
    #[default]
    Waived,
    /// The member must also hold an auth identity for the organization's provider.
    LinkedIdentity,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slack.verification_token.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "slack.verification_token cannot be empty".to_string(),
            ));
        }
        if looks_like_placeholder_token(&self.slack.verification_token) {
            return Err(ConfigError::InvalidConfig(
                "slack.verification_token is still using a placeholder value".to_string(),
            ));
        }

        regex::Regex::new(&self.slack.response_url_pattern)?;

        if !self.slack.link_url_template.contains(":organization") {
            return Err(ConfigError::InvalidConfig(
                "slack.link_url_template must contain :organization".to_string(),
            ));
        }

        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }
        if self.database.db_type() == DbType::Unsupported {
            return Err(ConfigError::InvalidConfig(format!(
                "unsupported database url {} (expected sqlite://...)",
                self.database.connection_string()
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        Ok(())
    }

    fn normalize(&mut self) {
        self.slack.verification_token = self.slack.verification_token.trim().to_string();
        self.slack.api_base_url = self.slack.api_base_url.trim_end_matches('/').to_string();
        self.server.url_prefix = self.server.url_prefix.trim_end_matches('/').to_string();
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("SLACK_ACTIONS_VERIFICATION_TOKEN") {
            self.slack.verification_token = value;
        }
        if let Ok(value) = std::env::var("SLACK_ACTIONS_DATABASE_URL") {
            self.database.url = Some(value);
        }
        if let Ok(value) = std::env::var("SLACK_ACTIONS_URL_PREFIX") {
            self.server.url_prefix = value;
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9006
}

fn default_url_prefix() -> String {
    "http://localhost:9006".to_string()
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_response_url_pattern() -> String {
    r"^https://hooks\.slack\.com/".to_string()
}

fn default_link_url_template() -> String {
    ":url_prefix/account/settings/identities/associate/:organization/:provider/".to_string()
}

fn default_database_url() -> String {
    "sqlite://slack-actions.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_allow_superuser() -> bool {
    true
}

fn looks_like_placeholder_token(token: &str) -> bool {
    let lower = token.trim().to_ascii_lowercase();
    lower == "your_verification_token"
        || lower == "your-token-here"
        || lower == "changeme"
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
slack:
  verification_token: " xyz-verification "
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = Config::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.slack.verification_token, "xyz-verification");
        assert_eq!(config.slack.api_base_url, "https://slack.com/api");
        assert_eq!(config.server.port, 9006);
        assert_eq!(config.database.db_type(), DbType::Sqlite);
        assert_eq!(
            config.database.sqlite_path().as_deref(),
            Some("slack-actions.db")
        );
        assert!(config.permissions.allow_superuser);
        assert_eq!(config.permissions.sso, SsoRequirement::Waived);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn permission_policy_parses_snake_case() {
        let yaml = r#"
slack:
  verification_token: abc
permissions:
  allow_superuser: false
  sso: linked_identity
logging:
  level: debug
  format: json
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert!(!config.permissions.allow_superuser);
        assert_eq!(config.permissions.sso, SsoRequirement::LinkedIdentity);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn placeholder_token_is_rejected() {
        let yaml = "slack:\n  verification_token: changeme\n";
        assert!(matches!(
            Config::from_yaml_str(yaml),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn broken_response_url_pattern_is_rejected() {
        let yaml = "slack:\n  verification_token: abc\n  response_url_pattern: '^https://(('\n";
        assert!(matches!(
            Config::from_yaml_str(yaml),
            Err(ConfigError::Pattern(_))
        ));
    }

    #[test]
    fn non_sqlite_database_is_rejected() {
        let yaml = "slack:\n  verification_token: abc\ndatabase:\n  url: postgres://localhost/db\n";
        assert!(matches!(
            Config::from_yaml_str(yaml),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let yaml = r#"
slack:
  verification_token: abc
  api_base_url: http://127.0.0.1:9999/api/
server:
  url_prefix: https://issues.example.com/
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.slack.api_base_url, "http://127.0.0.1:9999/api");
        assert_eq!(config.server.url_prefix, "https://issues.example.com");
    }
}
