// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! Execution of a single remote request
//!
//! A `RequestContext` is created when an operation is issued and carries the
//! operation tag, so the response handler is chosen at issue time.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::{stream, StreamExt};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use desktop_remote_common::response::{
    check_shutdown, check_success, evaluate, parse_response, require_string, string_field,
};
use desktop_remote_common::{
    AuthToken, Error, JsonMap, KeyboardRequest, MouseRequest, Operation, RequestId, Result,
    Screenshot, ServerEndpoint, TransferDirection,
};

use super::registry::RegistryGuard;
use super::transport::{build_request, classify_transport_error};
use crate::events::Notification;
use crate::transfer::{self, ProgressTracker, UPLOAD_CHUNK_SIZE};

/// Work requested by one operation call
#[derive(Debug)]
pub(crate) enum Job {
    Metrics,
    Shutdown,
    ListFiles { path: String },
    Download { remote_path: String, local_path: PathBuf },
    Upload { local_path: PathBuf, remote_path: String },
    Screenshot,
    Mouse(MouseRequest),
    Keyboard(KeyboardRequest),
}

impl Job {
    pub(crate) fn operation(&self) -> Operation {
        match self {
            Job::Metrics => Operation::FetchMetrics,
            Job::Shutdown => Operation::Shutdown,
            Job::ListFiles { .. } => Operation::ListFiles,
            Job::Download { .. } => Operation::DownloadFile,
            Job::Upload { .. } => Operation::UploadFile,
            Job::Screenshot => Operation::CaptureScreen,
            Job::Mouse(_) => Operation::MouseControl,
            Job::Keyboard(_) => Operation::KeyboardInput,
        }
    }
}

/// Successful result of a job, before it is turned into a notification
#[derive(Debug)]
enum Completed {
    Metrics(JsonMap),
    Shutdown(String),
    Listing(JsonMap),
    Downloaded { filename: String, local_path: PathBuf },
    Uploaded { filename: String },
    Screenshot(Screenshot),
    Mouse(String),
    Keyboard(String),
}

/// Notification sender for one request
///
/// Progress is dropped once the terminal notification has been sent; the
/// lock is held while sending so the two can never interleave.
#[derive(Clone)]
pub(crate) struct RequestSink {
    id: RequestId,
    tx: mpsc::UnboundedSender<Notification>,
    open: Arc<Mutex<bool>>,
}

impl RequestSink {
    pub(crate) fn new(id: RequestId, tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self {
            id,
            tx,
            open: Arc::new(Mutex::new(true)),
        }
    }

    fn progress(&self, direction: TransferDirection, name: &str, percent: u8) {
        let open = self.open.lock().unwrap_or_else(|e| e.into_inner());
        if *open {
            let _ = self.tx.send(Notification::TransferProgress {
                request: self.id,
                direction,
                name: name.to_string(),
                percent,
            });
        }
    }

    fn finish(&self, notification: Notification) {
        let mut open = self.open.lock().unwrap_or_else(|e| e.into_inner());
        *open = false;
        if self.tx.send(notification).is_err() {
            debug!(request = %self.id, "Notification receiver dropped");
        }
    }
}

/// Everything a spawned request task needs
pub(crate) struct RequestContext {
    pub(crate) id: RequestId,
    pub(crate) endpoint: ServerEndpoint,
    pub(crate) token: Option<AuthToken>,
    pub(crate) http: Client,
    pub(crate) sink: RequestSink,
}

impl RequestContext {
    /// Run the job to completion, without emitting the terminal notification
    async fn execute(&self, job: &Job) -> Result<Completed> {
        let operation = job.operation();
        match job {
            Job::Metrics => {
                let mut map = self.get_json(operation, None).await?;
                map.remove("success");
                Ok(Completed::Metrics(map))
            }
            Job::Shutdown => {
                let map = self.get_response(operation, None).await?;
                Ok(Completed::Shutdown(check_shutdown(&map)?))
            }
            Job::ListFiles { path } => {
                let map = self.get_json(operation, Some(path.as_str())).await?;
                Ok(Completed::Listing(map))
            }
            Job::Download {
                remote_path,
                local_path,
            } => self.download(remote_path, local_path).await,
            Job::Upload {
                local_path,
                remote_path,
            } => self.upload(local_path, remote_path).await,
            Job::Screenshot => {
                let map = self.get_json(operation, None).await?;
                Ok(Completed::Screenshot(Screenshot::from_map(map)?))
            }
            Job::Mouse(body) => {
                let map = self.post_json(operation, body).await?;
                let message = string_field(&map, "message").unwrap_or_else(|| "OK".to_string());
                Ok(Completed::Mouse(message))
            }
            Job::Keyboard(body) => {
                let map = self.post_json(operation, body).await?;
                let message = string_field(&map, "message").unwrap_or_else(|| "OK".to_string());
                Ok(Completed::Keyboard(message))
            }
        }
    }

    /// Run the job and emit exactly one terminal notification
    ///
    /// The registry entry is released before the notification is sent.
    pub(crate) async fn run(self, job: Job, cancel: CancellationToken, guard: RegistryGuard) {
        let operation = job.operation();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            outcome = self.execute(&job) => outcome,
        };

        drop(guard);
        match &outcome {
            Ok(_) => info!(request = %self.id, %operation, "Request completed"),
            Err(e) => warn!(request = %self.id, %operation, "Request failed: {}", e),
        }

        self.sink.finish(terminal_notification(self.id, operation, outcome));
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| Error::Transport(classify_transport_error(&e)))
    }

    async fn read_body(&self, response: Response) -> Result<(u16, Vec<u8>)> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(classify_transport_error(&e)))?;
        debug!(request = %self.id, status, "Response received ({} bytes)", body.len());
        Ok((status, body.to_vec()))
    }

    async fn get_json(&self, operation: Operation, path: Option<&str>) -> Result<JsonMap> {
        check_success(self.get_response(operation, path).await?, operation)
    }

    /// GET and parse, leaving the `success` check to the caller
    async fn get_response(&self, operation: Operation, path: Option<&str>) -> Result<JsonMap> {
        let url = self.endpoint.url(operation, path);
        debug!(request = %self.id, "GET {}", url);
        let request = build_request(&self.http, operation.method(), &url, self.token.as_ref());
        let response = self.send(request).await?;
        let (status, body) = self.read_body(response).await?;
        parse_response(status, &body)
    }

    async fn post_json<T: serde::Serialize>(&self, operation: Operation, body: &T) -> Result<JsonMap> {
        let url = self.endpoint.url(operation, None);
        debug!(request = %self.id, "POST {}", url);
        let request = build_request(&self.http, operation.method(), &url, self.token.as_ref()).json(body);
        let response = self.send(request).await?;
        let (status, body) = self.read_body(response).await?;
        evaluate(status, &body, operation)
    }

    async fn download(&self, remote_path: &str, local_path: &Path) -> Result<Completed> {
        let operation = Operation::DownloadFile;
        let url = self.endpoint.url(operation, Some(remote_path));
        debug!(request = %self.id, "GET {}", url);

        let request = build_request(&self.http, operation.method(), &url, self.token.as_ref());
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let total = response.content_length();

        let mut tracker = ProgressTracker::new(total);
        let mut body = Vec::with_capacity(total.unwrap_or(0).min(64 * 1024 * 1024) as usize);
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| Error::Transport(classify_transport_error(&e)))?;
            body.extend_from_slice(&chunk);
            if let Some(percent) = tracker.advance(chunk.len() as u64) {
                self.sink
                    .progress(TransferDirection::Download, remote_path, percent);
            }
        }
        debug!(request = %self.id, status, "Download body received ({} bytes)", body.len());

        let map = evaluate(status, &body, operation)?;
        let data = require_string(&map, "data")?;
        let filename = require_string(&map, "filename")?;

        let bytes = transfer::decode_payload(&data)?;
        transfer::save_download(local_path, &bytes).await?;
        info!(
            request = %self.id,
            "Saved {} ({} bytes) to {:?}",
            filename,
            bytes.len(),
            local_path
        );

        Ok(Completed::Downloaded {
            filename,
            local_path: local_path.to_path_buf(),
        })
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<Completed> {
        let operation = Operation::UploadFile;

        // Local checks happen before any network traffic
        let upload = transfer::prepare_upload(local_path).await?;
        let filename = upload.filename.clone();
        let payload = serde_json::to_vec(&upload)
            .map_err(|e| Error::Protocol(format!("Failed to encode upload body: {}", e)))?;
        drop(upload);

        let total = payload.len() as u64;
        let chunks: Vec<Vec<u8>> = payload.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        drop(payload);

        let sink = self.sink.clone();
        let progress_name = filename.clone();
        let mut tracker = ProgressTracker::new(Some(total));
        let body_stream = stream::iter(chunks).map(move |chunk| {
            if let Some(percent) = tracker.advance(chunk.len() as u64) {
                sink.progress(TransferDirection::Upload, &progress_name, percent);
            }
            Ok::<_, std::io::Error>(chunk)
        });

        let url = self.endpoint.url(operation, Some(remote_path));
        debug!(request = %self.id, "POST {} ({} bytes)", url, total);

        let request = build_request(&self.http, operation.method(), &url, self.token.as_ref())
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(body_stream));
        let response = self.send(request).await?;
        let (status, body) = self.read_body(response).await?;
        evaluate(status, &body, operation)?;

        Ok(Completed::Uploaded { filename })
    }
}

/// Map a job outcome onto the notification contract of its operation
fn terminal_notification(
    request: RequestId,
    operation: Operation,
    outcome: Result<Completed>,
) -> Notification {
    match outcome {
        Ok(Completed::Metrics(metrics)) => Notification::MetricsReceived { request, metrics },
        Ok(Completed::Shutdown(message)) => Notification::ShutdownCompleted {
            request,
            success: true,
            message,
        },
        Ok(Completed::Listing(listing)) => Notification::FileListReceived { request, listing },
        Ok(Completed::Downloaded {
            filename,
            local_path,
        }) => Notification::DownloadCompleted {
            request,
            filename,
            local_path,
        },
        Ok(Completed::Uploaded { filename }) => Notification::UploadCompleted { request, filename },
        Ok(Completed::Screenshot(screenshot)) => Notification::ScreenshotReady {
            request,
            screenshot,
        },
        Ok(Completed::Mouse(message)) => Notification::MouseControlResult {
            request,
            success: true,
            message,
        },
        Ok(Completed::Keyboard(message)) => Notification::KeyboardInputResult {
            request,
            success: true,
            message,
        },
        Err(e) => failure_notification(request, operation, e.to_string()),
    }
}

fn failure_notification(request: RequestId, operation: Operation, error: String) -> Notification {
    match operation {
        Operation::Shutdown => Notification::ShutdownCompleted {
            request,
            success: false,
            message: error,
        },
        Operation::MouseControl => Notification::MouseControlResult {
            request,
            success: false,
            message: error,
        },
        Operation::KeyboardInput => Notification::KeyboardInputResult {
            request,
            success: false,
            message: error,
        },
        op if op.is_file_operation() => Notification::FileOperationFailed {
            request,
            operation,
            error,
        },
        _ => Notification::OperationFailed {
            request,
            operation,
            error,
        },
    }
}
