//! Construction of a `FlowClient` from configuration
//!
//! The one place that knows about API generations. Everything downstream
//! of the returned trait object is version-agnostic.

use crate::auth::{CookieSession, Credentials, OAuth2Tokens};
use crate::config::{ApiVersion, AuthMode, Config, ConfigError};
use crate::http::Http;
use crate::v1::V1Client;
use crate::v2::V2Client;
use flowctl_engine::FlowClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build the client implementation selected by `config.api.version`.
pub fn for_version(config: &Config) -> Result<Arc<dyn FlowClient>, ConfigError> {
    config.validate()?;
    let version = config.api.version.ok_or_else(|| ConfigError::Invalid {
        issues: vec!["api: no version configured (v1 or v2)".to_string()],
    })?;

    let mut builder =
        reqwest::Client::builder().timeout(Duration::from_millis(config.http.timeout_ms));
    if config.auth.mode == AuthMode::Cookie {
        // the session cookie must ride along on every API call
        builder = builder.cookie_store(true);
    }
    let client = builder
        .build()
        .map_err(|err| ConfigError::Http(err.to_string()))?;

    let credentials = match config.auth.mode {
        AuthMode::None => Credentials::None,
        AuthMode::OAuth2 => Credentials::OAuth2(OAuth2Tokens::new(
            client.clone(),
            config.auth.oauth2.clone(),
        )),
        AuthMode::Cookie => Credentials::Cookie(CookieSession::new(
            client.clone(),
            config.auth.cookie.clone(),
        )),
    };
    let http = Http::new(client, credentials);

    debug!(%version, "constructing flow client");
    Ok(match version {
        ApiVersion::V1 => Arc::new(V1Client::new(
            http,
            &config.api.gateway_url,
            &config.api.ops_url,
            &config.app.tenant,
        )),
        ApiVersion::V2 => Arc::new(V2Client::new(
            http,
            &config.api.gateway_url,
            &config.app.tenant,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_version_is_rejected() {
        let config = Config::default();
        assert!(matches!(
            for_version(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_v2_client_builds_from_minimal_config() {
        let mut config = Config::default();
        config.api.version = Some(ApiVersion::V2);
        config.api.gateway_url = "http://localhost:8080".to_string();
        assert!(for_version(&config).is_ok());
    }
}
