// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! Notifications delivered to the presentation layer

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use desktop_remote_common::{JsonMap, Operation, RequestId, Screenshot, TransferDirection};

/// Receiving end of the client's notification channel
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Outcome or progress event for one issued request
///
/// Every request produces exactly one terminal notification. Progress events,
/// when present, always precede it.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Metrics fields, without the `success` discriminator
    MetricsReceived { request: RequestId, metrics: JsonMap },

    /// Failure of a non-file operation (metrics, screen capture)
    OperationFailed {
        request: RequestId,
        operation: Operation,
        error: String,
    },

    ShutdownCompleted {
        request: RequestId,
        success: bool,
        message: String,
    },

    /// Full listing response
    FileListReceived { request: RequestId, listing: JsonMap },

    FileOperationFailed {
        request: RequestId,
        operation: Operation,
        error: String,
    },

    TransferProgress {
        request: RequestId,
        direction: TransferDirection,
        /// Remote path for downloads, file name for uploads
        name: String,
        percent: u8,
    },

    DownloadCompleted {
        request: RequestId,
        filename: String,
        local_path: PathBuf,
    },

    UploadCompleted { request: RequestId, filename: String },

    ScreenshotReady {
        request: RequestId,
        screenshot: Screenshot,
    },

    MouseControlResult {
        request: RequestId,
        success: bool,
        message: String,
    },

    KeyboardInputResult {
        request: RequestId,
        success: bool,
        message: String,
    },
}

impl Notification {
    pub fn request(&self) -> RequestId {
        match self {
            Notification::MetricsReceived { request, .. }
            | Notification::OperationFailed { request, .. }
            | Notification::ShutdownCompleted { request, .. }
            | Notification::FileListReceived { request, .. }
            | Notification::FileOperationFailed { request, .. }
            | Notification::TransferProgress { request, .. }
            | Notification::DownloadCompleted { request, .. }
            | Notification::UploadCompleted { request, .. }
            | Notification::ScreenshotReady { request, .. }
            | Notification::MouseControlResult { request, .. }
            | Notification::KeyboardInputResult { request, .. } => *request,
        }
    }

    /// Everything except progress ends its request
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::TransferProgress { .. })
    }

    /// Whether this terminal notification reports success
    pub fn is_success(&self) -> bool {
        match self {
            Notification::OperationFailed { .. } | Notification::FileOperationFailed { .. } => {
                false
            }
            Notification::ShutdownCompleted { success, .. }
            | Notification::MouseControlResult { success, .. }
            | Notification::KeyboardInputResult { success, .. } => *success,
            _ => true,
        }
    }

    /// Invoke the matching handler callback
    pub fn dispatch<H: RemoteEventHandler + ?Sized>(&self, handler: &H) {
        match self {
            Notification::MetricsReceived { request, metrics } => {
                handler.on_metrics(*request, metrics)
            }
            Notification::OperationFailed {
                request,
                operation,
                error,
            } => handler.on_operation_failed(*request, *operation, error),
            Notification::ShutdownCompleted {
                request,
                success,
                message,
            } => handler.on_shutdown_completed(*request, *success, message),
            Notification::FileListReceived { request, listing } => {
                handler.on_file_list(*request, listing)
            }
            Notification::FileOperationFailed {
                request,
                operation,
                error,
            } => handler.on_file_operation_failed(*request, *operation, error),
            Notification::TransferProgress {
                request,
                direction,
                name,
                percent,
            } => handler.on_transfer_progress(*request, *direction, name, *percent),
            Notification::DownloadCompleted {
                request,
                filename,
                local_path,
            } => handler.on_download_completed(*request, filename, local_path),
            Notification::UploadCompleted { request, filename } => {
                handler.on_upload_completed(*request, filename)
            }
            Notification::ScreenshotReady {
                request,
                screenshot,
            } => handler.on_screenshot(*request, screenshot),
            Notification::MouseControlResult {
                request,
                success,
                message,
            } => handler.on_mouse_result(*request, *success, message),
            Notification::KeyboardInputResult {
                request,
                success,
                message,
            } => handler.on_keyboard_result(*request, *success, message),
        }
    }
}

/// Framework-agnostic notification handler trait
///
/// GUI implementations should implement this trait to react to remote
/// operation outcomes and update their UI accordingly.
pub trait RemoteEventHandler: Send + Sync {
    /// Called when metrics were received
    fn on_metrics(&self, request: RequestId, metrics: &JsonMap);

    /// Called when a metrics or screen capture request failed
    fn on_operation_failed(&self, request: RequestId, operation: Operation, error: &str);

    /// Called when a shutdown request resolved, successfully or not
    fn on_shutdown_completed(&self, request: RequestId, success: bool, message: &str);

    /// Called when a directory listing was received
    fn on_file_list(&self, request: RequestId, listing: &JsonMap);

    /// Called when a list, download or upload request failed
    fn on_file_operation_failed(&self, request: RequestId, operation: Operation, error: &str);

    fn on_transfer_progress(
        &self,
        _request: RequestId,
        _direction: TransferDirection,
        _name: &str,
        _percent: u8,
    ) {
    }

    fn on_download_completed(&self, request: RequestId, filename: &str, local_path: &Path);

    fn on_upload_completed(&self, request: RequestId, filename: &str);

    fn on_screenshot(&self, _request: RequestId, _screenshot: &Screenshot) {}

    fn on_mouse_result(&self, _request: RequestId, _success: bool, _message: &str) {}

    fn on_keyboard_result(&self, _request: RequestId, _success: bool, _message: &str) {}
}

/// Drain notifications into a handler until every client handle is dropped
pub async fn forward_notifications<H: RemoteEventHandler + ?Sized>(
    mut receiver: NotificationReceiver,
    handler: &H,
) {
    while let Some(notification) = receiver.recv().await {
        notification.dispatch(handler);
    }
}
