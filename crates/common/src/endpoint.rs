// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! Fixed endpoint table of the companion server
//!
//! Every remote operation maps to exactly one HTTP method and path. The
//! operation tag travels with its request so responses never have to be
//! classified by inspecting URLs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::network::{encode_query_value, format_host_port};

/// Default port the companion server listens on
pub const DEFAULT_PORT: u16 = 8080;

/// HTTP method used by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Logical remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    FetchMetrics,
    Shutdown,
    ListFiles,
    DownloadFile,
    UploadFile,
    CaptureScreen,
    MouseControl,
    KeyboardInput,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::FetchMetrics,
        Operation::Shutdown,
        Operation::ListFiles,
        Operation::DownloadFile,
        Operation::UploadFile,
        Operation::CaptureScreen,
        Operation::MouseControl,
        Operation::KeyboardInput,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Operation::FetchMetrics => "/metrics",
            Operation::Shutdown => "/shutdown",
            Operation::ListFiles => "/files/list",
            Operation::DownloadFile => "/files/download",
            Operation::UploadFile => "/files/upload",
            Operation::CaptureScreen => "/desktop/screenshot",
            Operation::MouseControl => "/desktop/mouse",
            Operation::KeyboardInput => "/desktop/keyboard",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::UploadFile | Operation::MouseControl | Operation::KeyboardInput => {
                Method::Post
            }
            _ => Method::Get,
        }
    }

    /// Message used when the server reports failure without an `error` string
    pub fn default_error(&self) -> &'static str {
        match self {
            Operation::FetchMetrics => "Server returned unsuccessful response",
            Operation::Shutdown => "Shutdown failed",
            Operation::ListFiles => "Unknown error",
            Operation::DownloadFile => "Download failed",
            Operation::UploadFile => "Upload failed",
            Operation::CaptureScreen => "Screen capture failed",
            Operation::MouseControl => "Mouse control failed",
            Operation::KeyboardInput => "Keyboard input failed",
        }
    }

    /// File operations report failures through the file-specific notification
    pub fn is_file_operation(&self) -> bool {
        matches!(
            self,
            Operation::ListFiles | Operation::DownloadFile | Operation::UploadFile
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::FetchMetrics => "fetch metrics",
            Operation::Shutdown => "shutdown",
            Operation::ListFiles => "list files",
            Operation::DownloadFile => "download",
            Operation::UploadFile => "upload",
            Operation::CaptureScreen => "screen capture",
            Operation::MouseControl => "mouse control",
            Operation::KeyboardInput => "keyboard input",
        };
        f.write_str(name)
    }
}

/// Target host and port of the companion server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            host: host.trim().to_string(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", format_host_port(&self.host, self.port))
    }

    /// Full URL for an operation, with an optional percent-encoded `path` query
    pub fn url(&self, operation: Operation, path_param: Option<&str>) -> String {
        let mut url = format!("{}{}", self.base_url(), operation.path());
        if let Some(path) = path_param {
            url.push_str("?path=");
            url.push_str(&encode_query_value(path));
        }
        url
    }
}
