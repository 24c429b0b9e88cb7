// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! Remote-control client for the desktop companion server
//!
//! Every operation returns immediately with a `RequestId`; its outcome is
//! delivered later on the notification channel returned by
//! `RemoteControlClient::new`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Client;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use desktop_remote_common::{
    is_loopback_address, AuthToken, ClientConfig, Error, KeyboardInput, MouseEvent, Operation,
    RequestId, Result, ServerEndpoint,
};

use super::registry::Registry;
use super::request::{Job, RequestContext, RequestSink};
use super::transport::create_http_client;
use crate::events::{Notification, NotificationReceiver};

struct Inner {
    http: Client,
    config: ClientConfig,
    events: mpsc::UnboundedSender<Notification>,
    registry: Registry,
    runtime: Handle,
    shutdown: CancellationToken,
    cleartext_warned: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Last handle gone: abandon whatever is still running
        self.shutdown.cancel();
    }
}

/// Client for the companion server's remote-control API
///
/// Cheap to clone; all clones share one HTTP client, one notification
/// channel and one set of in-flight requests.
#[derive(Clone)]
pub struct RemoteControlClient {
    inner: Arc<Inner>,
}

impl RemoteControlClient {
    /// Create a client and the receiving end of its notification channel
    ///
    /// Must be called from within a Tokio runtime. Operations may afterwards
    /// be issued from any thread.
    pub fn new(config: ClientConfig) -> Result<(Self, NotificationReceiver)> {
        let runtime = Handle::try_current().map_err(|_| {
            Error::Config("RemoteControlClient must be created inside a Tokio runtime".to_string())
        })?;
        let http = create_http_client(&config)?;
        let (events, receiver) = mpsc::unbounded_channel();

        debug!(
            "Remote control client created (timeout {}s, connect timeout {}s)",
            config.request_timeout_secs, config.connect_timeout_secs
        );

        let client = Self {
            inner: Arc::new(Inner {
                http,
                config,
                events,
                registry: Registry::default(),
                runtime,
                shutdown: CancellationToken::new(),
                cleartext_warned: AtomicBool::new(false),
            }),
        };

        Ok((client, receiver))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Fetch system metrics
    ///
    /// `username` is accepted for interface symmetry and not sent. A
    /// non-empty `token` replaces the configured one for this request.
    pub fn fetch_metrics(&self, host: &str, _username: &str, token: &str, port: u16) -> RequestId {
        let token = AuthToken::from_optional(token).or_else(|| self.inner.config.token());
        self.issue(host, port, token, Job::Metrics)
    }

    /// Ask the remote desktop to shut down
    pub fn shutdown_host(&self, host: &str, port: u16) -> RequestId {
        self.issue(host, port, self.inner.config.token(), Job::Shutdown)
    }

    /// List a remote directory
    pub fn list_files(&self, host: &str, port: u16, path: &str) -> RequestId {
        let job = Job::ListFiles {
            path: path.to_string(),
        };
        self.issue(host, port, self.inner.config.token(), job)
    }

    /// Download `remote_path` and save it to `local_save_path`
    pub fn download_file(
        &self,
        host: &str,
        port: u16,
        remote_path: &str,
        local_save_path: impl Into<PathBuf>,
    ) -> RequestId {
        let job = Job::Download {
            remote_path: remote_path.to_string(),
            local_path: local_save_path.into(),
        };
        self.issue(host, port, self.inner.config.token(), job)
    }

    /// Upload `local_path` into the remote directory `remote_path`
    ///
    /// The local file is checked before anything is sent.
    pub fn upload_file(
        &self,
        host: &str,
        port: u16,
        local_path: impl Into<PathBuf>,
        remote_path: &str,
    ) -> RequestId {
        let job = Job::Upload {
            local_path: local_path.into(),
            remote_path: remote_path.to_string(),
        };
        self.issue(host, port, self.inner.config.token(), job)
    }

    pub fn capture_screen(&self, host: &str, port: u16) -> RequestId {
        self.issue(host, port, self.inner.config.token(), Job::Screenshot)
    }

    pub fn send_mouse_event(&self, host: &str, port: u16, event: MouseEvent) -> RequestId {
        self.issue(host, port, self.inner.config.token(), Job::Mouse(event.into()))
    }

    pub fn send_keyboard_input(&self, host: &str, port: u16, input: KeyboardInput) -> RequestId {
        self.issue(host, port, self.inner.config.token(), Job::Keyboard(input.into()))
    }

    /// Cancel one request; returns false if it already resolved
    ///
    /// A cancelled request still emits its terminal failure notification.
    pub fn cancel(&self, request: RequestId) -> bool {
        let cancelled = self.inner.registry.cancel(request);
        if cancelled {
            debug!(request = %request, "Cancellation requested");
        }
        cancelled
    }

    /// Cancel every in-flight request
    pub fn cancel_all(&self) {
        for (request, _) in self.inner.registry.snapshot() {
            self.inner.registry.cancel(request);
        }
    }

    /// Requests issued and not yet resolved
    pub fn in_flight(&self) -> Vec<(RequestId, Operation)> {
        self.inner.registry.snapshot()
    }

    fn issue(&self, host: &str, port: u16, token: Option<AuthToken>, job: Job) -> RequestId {
        let id = RequestId::new();
        let operation = job.operation();
        let endpoint = ServerEndpoint::new(host, port);

        if token.is_some() && !is_loopback_address(host) {
            self.warn_cleartext(host);
        }

        let cancel = self.inner.shutdown.child_token();
        let guard = self.inner.registry.register(id, operation, cancel.clone());

        debug!(
            request = %id,
            %operation,
            "Issuing request to {}",
            endpoint.base_url()
        );

        let context = RequestContext {
            id,
            endpoint,
            token,
            http: self.inner.http.clone(),
            sink: RequestSink::new(id, self.inner.events.clone()),
        };
        self.inner.runtime.spawn(context.run(job, cancel, guard));

        id
    }

    fn warn_cleartext(&self, host: &str) {
        if !self.inner.cleartext_warned.swap(true, Ordering::Relaxed) {
            warn!(
                "Sending bearer token over plain HTTP to non-loopback host {}",
                host
            );
        }
    }
}
