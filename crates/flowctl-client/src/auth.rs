//! Authentication against the workflow engine
//!
//! Two schemes, selected by configuration: OAuth2 client-credentials (a
//! bearer token fetched from a token endpoint and cached until shortly
//! before expiry) and cookie-session login (a login POST that primes the
//! shared reqwest cookie jar). Both are lazy: nothing talks to the
//! network until the first API call needs it.

use crate::config::{CookieConfig, OAuth2Config};
use flowctl_engine::ClientError;
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Renew this long before the token actually expires.
const EXPIRY_SLACK: Duration = Duration::from_secs(30);

/// Credentials attached to every API request
pub enum Credentials {
    /// No authentication
    None,
    /// OAuth2 client-credentials bearer token
    OAuth2(OAuth2Tokens),
    /// Cookie session primed by a login call
    Cookie(CookieSession),
}

impl Credentials {
    /// Decorate a request with whatever this scheme requires.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        match self {
            Credentials::None => Ok(request),
            Credentials::OAuth2(tokens) => {
                let token = tokens.bearer_token().await?;
                Ok(request.bearer_auth(token))
            }
            Credentials::Cookie(session) => {
                // the session cookie lives in the shared jar; just make
                // sure the login happened
                session.ensure_logged_in().await?;
                Ok(request)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    renew_at: Instant,
}

/// OAuth2 client-credentials token source with in-memory caching
pub struct OAuth2Tokens {
    http: reqwest::Client,
    config: OAuth2Config,
    cached: Mutex<Option<CachedToken>>,
}

impl OAuth2Tokens {
    pub fn new(http: reqwest::Client, config: OAuth2Config) -> Self {
        Self {
            http,
            config,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a fresh one when the cache is empty
    /// or about to expire.
    pub async fn bearer_token(&self) -> Result<String, ClientError> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.renew_at {
                return Ok(entry.token.clone());
            }
        }

        debug!(token_url = %self.config.token_url, "fetching oauth2 token");
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if let Some(scope) = &self.config.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| ClientError::Transport {
                message: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("token endpoint refused: {message}"),
            });
        }
        let token: TokenResponse =
            response.json().await.map_err(|err| ClientError::Malformed {
                message: format!("token response: {err}"),
            })?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(300));
        let renew_at = Instant::now() + lifetime.saturating_sub(EXPIRY_SLACK);
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            renew_at,
        });
        Ok(token.access_token)
    }
}

/// Cookie-session login state; the cookie itself lives in the reqwest jar
pub struct CookieSession {
    http: reqwest::Client,
    config: CookieConfig,
    logged_in: Mutex<bool>,
}

impl CookieSession {
    /// `http` must have its cookie store enabled and be the same client
    /// used for API calls, so the session cookie is shared.
    pub fn new(http: reqwest::Client, config: CookieConfig) -> Self {
        Self {
            http,
            config,
            logged_in: Mutex::new(false),
        }
    }

    pub async fn ensure_logged_in(&self) -> Result<(), ClientError> {
        let mut logged_in = self.logged_in.lock().await;
        if *logged_in {
            return Ok(());
        }

        let url = format!("{}/api/login", self.config.base_url.trim_end_matches('/'));
        debug!(%url, "performing cookie login");
        let response = self
            .http
            .post(&url)
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|err| ClientError::Transport {
                message: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("login refused: {message}"),
            });
        }
        *logged_in = true;
        Ok(())
    }
}
