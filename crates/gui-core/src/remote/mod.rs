// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! Remote control module - HTTP client for the companion desktop server
//!
//! One shared HTTP client, one spawned task per request, and an explicit
//! per-request context so every response is routed by the operation it was
//! issued for.

pub mod client;
mod registry;
mod request;
pub mod transport;

pub use client::RemoteControlClient;
pub use transport::{classify_transport_error, create_http_client};
