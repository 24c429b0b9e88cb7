// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! Framework-agnostic client core for Desktop Remote
//!
//! This crate talks to the companion server running on the remote desktop
//! and reports every outcome as a `Notification`, so GTK, Qt or terminal
//! front ends can bind to it without sharing any UI state.

pub mod events;
pub mod remote;
pub mod transfer;

// Re-export commonly used types
pub use events::{forward_notifications, Notification, NotificationReceiver, RemoteEventHandler};
pub use remote::RemoteControlClient;
pub use transfer::ProgressTracker;

// Re-export types from common crate for convenience
pub use desktop_remote_common::{
    ClientConfig, Error, ErrorKind, FileItem, FileListing, JsonMap, KeyboardInput, MouseButton,
    MouseEvent, Operation, RequestId, Result, Screenshot, SystemMetrics, TransferDirection,
    DEFAULT_PORT,
};
