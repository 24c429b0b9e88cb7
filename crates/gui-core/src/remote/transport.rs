// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! HTTP client construction and transport error mapping

use std::error::Error as StdError;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};

use desktop_remote_common::{AuthToken, ClientConfig, Error, Method, Result, TransportError};

/// Create the HTTP client shared by every request of a `RemoteControlClient`
///
/// # Arguments
/// * `config` - Client configuration (timeouts)
///
/// # Returns
/// Configured reqwest::Client
pub fn create_http_client(config: &ClientConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        // The companion server lives on the local network
        .no_proxy()
        .user_agent(concat!("desktop-remote/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Start a request with the JSON content type and optional bearer token
pub(crate) fn build_request(
    client: &Client,
    method: Method,
    url: &str,
    token: Option<&AuthToken>,
) -> RequestBuilder {
    let request = match method {
        Method::Get => client.get(url),
        Method::Post => client.post(url),
    };
    let request = request.header(CONTENT_TYPE, "application/json");

    match token {
        Some(token) => request.header(AUTHORIZATION, token.bearer_header()),
        None => request,
    }
}

/// Map a reqwest error onto the fixed transport error messages
pub fn classify_transport_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::TimedOut;
    }

    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => return TransportError::ConnectionRefused,
                std::io::ErrorKind::TimedOut => return TransportError::TimedOut,
                _ => {}
            }
        }
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }

    classify_message(&chain)
}

fn classify_message(chain: &str) -> TransportError {
    let lower = chain.to_lowercase();
    if lower.contains("connection refused") {
        TransportError::ConnectionRefused
    } else if lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
        || lower.contains("no such host")
    {
        TransportError::HostNotFound
    } else if lower.contains("timed out") {
        TransportError::TimedOut
    } else {
        TransportError::Other(chain.to_string())
    }
}
