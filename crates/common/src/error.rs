// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

// Error types for Desktop Remote

use thiserror::Error;

/// Transport-level failures, each with a fixed user-facing message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection refused. Is the server running on your desktop?")]
    ConnectionRefused,

    #[error("Host not found. Check the IP address.")]
    HostNotFound,

    #[error("Connection timed out. Check your network connection.")]
    TimedOut,

    #[error("Authentication failed. Check your token.")]
    AuthenticationRequired,

    #[error("Network error: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Protocol(String),

    #[error("{0}")]
    Application(String),

    #[error("File does not exist: {0}")]
    FileNotFound(String),

    #[error("{context}: {source}")]
    LocalIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse error category, as surfaced to the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Application,
    LocalIo,
    Cancelled,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::Application(_) => ErrorKind::Application,
            Error::FileNotFound(_) | Error::LocalIo { .. } => ErrorKind::LocalIo,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Wrap an I/O error with a short description of what was being attempted
    pub fn local_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::LocalIo {
            context: context.into(),
            source,
        }
    }

    /// Body could not be parsed as JSON
    pub fn invalid_json(detail: impl std::fmt::Display) -> Self {
        Error::Protocol(format!("Invalid response from server: {}", detail))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Protocol(format!("Invalid base64 payload: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
