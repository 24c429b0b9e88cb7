// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

// Network utility functions

use std::net::{IpAddr, Ipv6Addr};

/// Check if a host address is a loopback address
/// Supports IPv4 (127.0.0.1, 127.x.x.x), IPv6 (::1), and hostname (localhost)
pub fn is_loopback_address(host: &str) -> bool {
    let host = host.trim();

    // Handle "localhost" as special case
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback();
    }

    // Unparseable hostnames are treated as remote
    false
}

/// Join host and port for use in a URL authority
///
/// Bare IPv6 literals are wrapped in brackets; already-bracketed hosts are kept as-is.
pub fn format_host_port(host: &str, port: u16) -> String {
    let host = host.trim();
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Percent-encode a value for use inside a query string
pub fn encode_query_value(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
