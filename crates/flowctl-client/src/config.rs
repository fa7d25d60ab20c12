//! Client configuration
//!
//! Deserialized from the CLI's TOML config file and overridable by flags.
//! Validation aggregates every missing field into one error so an operator
//! fixes the file in a single round trip. Secrets never appear in output:
//! use [`Config::redacted`] before rendering.

use flowctl_types::BackoffPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const REDACTED: &str = "******";

/// Remote API generation to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
}

impl std::str::FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(ApiVersion::V1),
            "v2" => Ok(ApiVersion::V2),
            _ => Err(ConfigError::Invalid {
                issues: vec![format!("unknown api version {s:?} (expected v1 or v2)")],
            }),
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiVersion::V1 => write!(f, "v1"),
            ApiVersion::V2 => write!(f, "v2"),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration:\n  {}", issues.join("\n  "))]
    Invalid { issues: Vec<String> },

    #[error("building http client: {0}")]
    Http(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub http: HttpConfig,
}

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tenant all operations are scoped to
    pub tenant: String,
    /// Default backoff for convergence waits
    pub backoff: BackoffPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tenant: "default".to_string(),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Remote endpoint settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub version: Option<ApiVersion>,
    /// Gateway service base URL (v1 cancellations/deployments; the single
    /// base URL of the unified v2 service)
    pub gateway_url: String,
    /// Operations service base URL (v1 queries and deletes; unused by v2)
    pub ops_url: String,
}

/// Authentication settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub oauth2: OAuth2Config,
    pub cookie: CookieConfig,
}

/// How to authenticate against the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    None,
    OAuth2,
    Cookie,
}

/// OAuth2 client-credentials settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth2Config {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

/// Cookie-session login settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

impl Config {
    /// Check all sections, aggregating every issue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = Vec::new();

        match self.api.version {
            None => issues.push("api: no version configured (v1 or v2)".to_string()),
            Some(ApiVersion::V1) => {
                if self.api.gateway_url.is_empty() {
                    issues.push("api: no gateway_url configured".to_string());
                }
                if self.api.ops_url.is_empty() {
                    issues.push("api: no ops_url configured".to_string());
                }
            }
            Some(ApiVersion::V2) => {
                if self.api.gateway_url.is_empty() {
                    issues.push("api: no gateway_url configured".to_string());
                }
            }
        }
        for (name, value) in [
            ("api.gateway_url", &self.api.gateway_url),
            ("api.ops_url", &self.api.ops_url),
        ] {
            if !value.is_empty() && url::Url::parse(value).is_err() {
                issues.push(format!("{name}: {value:?} is not a valid URL"));
            }
        }

        match self.auth.mode {
            AuthMode::None => {}
            AuthMode::OAuth2 => {
                if self.auth.oauth2.token_url.is_empty() {
                    issues.push("auth: no token_url provided in oauth2 configuration".to_string());
                }
                if self.auth.oauth2.client_id.is_empty() {
                    issues.push("auth: no client_id provided in oauth2 configuration".to_string());
                }
                if self.auth.oauth2.client_secret.is_empty() {
                    issues
                        .push("auth: no client_secret provided in oauth2 configuration".to_string());
                }
            }
            AuthMode::Cookie => {
                if self.auth.cookie.base_url.is_empty() {
                    issues.push("auth: no base_url provided in cookie configuration".to_string());
                }
                if self.auth.cookie.username.is_empty() {
                    issues.push("auth: no username provided in cookie configuration".to_string());
                }
                if self.auth.cookie.password.is_empty() {
                    issues.push("auth: no password provided in cookie configuration".to_string());
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { issues })
        }
    }

    /// Copy of the config with secrets masked, safe to render.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        if !copy.auth.oauth2.client_id.is_empty() {
            copy.auth.oauth2.client_id = REDACTED.to_string();
        }
        if !copy.auth.oauth2.client_secret.is_empty() {
            copy.auth.oauth2.client_secret = REDACTED.to_string();
        }
        if !copy.auth.cookie.username.is_empty() {
            copy.auth.cookie.username = REDACTED.to_string();
        }
        if !copy.auth.cookie.password.is_empty() {
            copy.auth.cookie.password = REDACTED.to_string();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_v2() -> Config {
        let mut cfg = Config::default();
        cfg.api.version = Some(ApiVersion::V2);
        cfg.api.gateway_url = "http://localhost:8080".to_string();
        cfg
    }

    #[test]
    fn test_v2_needs_only_the_gateway_url() {
        assert!(valid_v2().validate().is_ok());
    }

    #[test]
    fn test_v1_needs_both_urls() {
        let mut cfg = valid_v2();
        cfg.api.version = Some(ApiVersion::V1);
        let err = cfg.validate().unwrap_err();
        match err {
            ConfigError::Invalid { issues } => {
                assert!(issues.iter().any(|i| i.contains("ops_url")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validation_aggregates_oauth2_issues() {
        let mut cfg = valid_v2();
        cfg.auth.mode = AuthMode::OAuth2;
        let err = cfg.validate().unwrap_err();
        match err {
            ConfigError::Invalid { issues } => assert_eq!(issues.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_redaction_masks_secrets() {
        let mut cfg = valid_v2();
        cfg.auth.oauth2.client_id = "svc-flowctl".to_string();
        cfg.auth.oauth2.client_secret = "hunter2".to_string();
        let safe = cfg.redacted();
        assert_eq!(safe.auth.oauth2.client_secret, "******");
        assert_eq!(safe.auth.oauth2.client_id, "******");
        // non-secret fields survive
        assert_eq!(safe.api.gateway_url, "http://localhost:8080");
    }

    #[test]
    fn test_config_parses_from_toml() {
        let cfg: Config = toml::from_str(
            r#"
            [app]
            tenant = "acme"

            [app.backoff]
            strategy = "fixed"
            initial_delay_ms = 250

            [api]
            version = "v2"
            gateway_url = "http://engine.local:8080"

            [auth]
            mode = "oauth2"

            [auth.oauth2]
            token_url = "http://idp.local/token"
            client_id = "svc"
            client_secret = "s3cr3t"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.app.tenant, "acme");
        assert_eq!(cfg.app.backoff.initial_delay_ms, 250);
        assert_eq!(cfg.api.version, Some(ApiVersion::V2));
        assert_eq!(cfg.auth.mode, AuthMode::OAuth2);
        assert!(cfg.validate().is_ok());
    }
}
