// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

// Desktop Remote - Common Library
// Wire types, endpoint table, response evaluation and configuration

pub mod config;
pub mod endpoint;
pub mod error;
pub mod network;
pub mod response;
pub mod types;

pub use config::{AuthToken, ClientConfig};
pub use endpoint::{Method, Operation, ServerEndpoint, DEFAULT_PORT};
pub use error::{Error, ErrorKind, Result, TransportError};
pub use network::{encode_query_value, format_host_port, is_loopback_address};
pub use response::{
    check_shutdown, check_success, evaluate, is_success, parse_body, parse_response, JsonMap,
};
pub use types::{
    FileItem, FileListing, KeyboardInput, KeyboardRequest, MouseButton, MouseEvent,
    MouseRequest, RequestId, Screenshot, SystemMetrics, TransferDirection, UploadRequest,
};

// Re-export commonly used external types
pub use uuid::Uuid;
