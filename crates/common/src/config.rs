// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

// Client configuration for Desktop Remote

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::endpoint::DEFAULT_PORT;

/// Client configuration for talking to the companion server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Default server host (e.g., "127.0.0.1" or "192.168.1.100")
    #[serde(default = "default_host")]
    pub host: String,

    /// Default server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token sent with every request (empty = no Authorization header)
    #[serde(default)]
    pub auth_token: String,

    /// Upper bound for a whole request, including body transfer
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound for establishing the TCP connection
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_token: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Configured token, if any
    pub fn token(&self) -> Option<AuthToken> {
        AuthToken::from_optional(&self.auth_token)
    }
}

/// Opaque bearer credential, wiped from memory on drop
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Zeroizing<String>);

impl AuthToken {
    /// Empty or whitespace-only input means "no token"
    pub fn from_optional(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(Zeroizing::new(token.to_string())))
        }
    }

    /// Value for the `Authorization` header
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0.as_str())
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(********)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.token().is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"host":"10.0.0.5","auth_token":"s3cret"}"#).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 8080);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.token().unwrap().bearer_header(), "Bearer s3cret");
    }

    #[test]
    fn test_token_is_redacted() {
        let token = AuthToken::from_optional("  abc123 ").unwrap();
        assert_eq!(token.expose(), "abc123");
        assert!(!format!("{:?}", token).contains("abc123"));
        assert!(AuthToken::from_optional("   ").is_none());
    }
}
