//! Client configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ApiError, ApiResult};

/// Default `User-Agent` sent by [`ReqwestTransport`](crate::ReqwestTransport).
pub const DEFAULT_USER_AGENT: &str = concat!("brezel-client/", env!("CARGO_PKG_VERSION"));

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const IMPERSONATE_HEADER: &str = "X-Impersonate";

/// Connection settings for a Brezel system.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API (e.g. `https://api.brezel.io`).
    pub api_url: String,
    /// Tenant segment prefixed to every request path.
    pub system: String,
    /// Sent as `X-API-Key`. Takes precedence over `bearer_token`.
    pub api_key: Option<String>,
    /// Sent as `Authorization: Bearer ...` when no API key is set.
    pub bearer_token: Option<String>,
    /// Base URL for share links; falls back to `api_url`.
    pub share_url: Option<String>,
    /// User to impersonate on every request.
    pub impersonate_user_id: Option<i64>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost".to_string(),
            system: String::new(),
            api_key: None,
            bearer_token: None,
            share_url: None,
            impersonate_user_id: None,
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<String>| s.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("system", &self.system)
            .field("api_key", &redact(&self.api_key))
            .field("bearer_token", &redact(&self.bearer_token))
            .field("share_url", &self.share_url)
            .field("impersonate_user_id", &self.impersonate_user_id)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            system: system.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_share_url(mut self, url: impl Into<String>) -> Self {
        self.share_url = Some(url.into());
        self
    }

    /// Reads `BREZEL_API_URL`, `BREZEL_SYSTEM`, `BREZEL_API_KEY`,
    /// `BREZEL_TOKEN` and `BREZEL_SHARE_URL` from the environment.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let api_url =
            var("BREZEL_API_URL").ok_or_else(|| ApiError::Config("BREZEL_API_URL not set".into()))?;
        let system =
            var("BREZEL_SYSTEM").ok_or_else(|| ApiError::Config("BREZEL_SYSTEM not set".into()))?;
        Ok(Self {
            api_url,
            system,
            api_key: var("BREZEL_API_KEY"),
            bearer_token: var("BREZEL_TOKEN"),
            share_url: var("BREZEL_SHARE_URL"),
            ..Default::default()
        })
    }

    /// Checks the URLs parse and a system is set.
    pub fn validate(&self) -> ApiResult<()> {
        if self.system.trim().is_empty() {
            return Err(ApiError::Config("system must not be empty".into()));
        }
        for (name, value) in [("api_url", Some(&self.api_url)), ("share_url", self.share_url.as_ref())] {
            if let Some(value) = value {
                Url::parse(value).map_err(|e| ApiError::Config(format!("{name}: {e}")))?;
            }
        }
        Ok(())
    }

    pub fn auth(&self) -> Auth {
        Auth::from_config(self)
    }
}

/// The single authentication mode of a client, fixed at construction.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    ApiKey(String),
    Bearer(String),
}

impl Auth {
    /// API key wins over bearer token; empty values count as unset.
    pub fn from_config(config: &ClientConfig) -> Self {
        let set = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        if let Some(key) = set(&config.api_key) {
            Auth::ApiKey(key)
        } else if let Some(token) = set(&config.bearer_token) {
            Auth::Bearer(token)
        } else {
            Auth::None
        }
    }

    /// The header this mode attaches to each request.
    pub fn header(&self) -> Option<(&'static str, String)> {
        match self {
            Auth::None => None,
            Auth::ApiKey(key) => Some((API_KEY_HEADER, key.clone())),
            Auth::Bearer(token) => Some((AUTHORIZATION_HEADER, format!("Bearer {token}"))),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => f.write_str("None"),
            Auth::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Auth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}
