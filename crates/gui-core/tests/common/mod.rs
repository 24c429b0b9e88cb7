// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! In-process mock of the companion server
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use desktop_remote_gui_core::{ClientConfig, Notification, NotificationReceiver, RemoteControlClient};

/// Serve `app` on an ephemeral loopback port
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A port nothing is listening on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

pub fn client() -> (RemoteControlClient, NotificationReceiver) {
    client_with(ClientConfig::default())
}

pub fn client_with(config: ClientConfig) -> (RemoteControlClient, NotificationReceiver) {
    RemoteControlClient::new(config).unwrap()
}

/// Collect notifications until the first terminal one
///
/// Returns the progress events seen on the way and the terminal event.
pub async fn until_terminal(rx: &mut NotificationReceiver) -> (Vec<Notification>, Notification) {
    let mut progress = Vec::new();
    loop {
        let notification = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no notification within 10s")
            .expect("notification channel closed");
        if notification.is_terminal() {
            return (progress, notification);
        }
        progress.push(notification);
    }
}

/// Progress percentages of a transfer, in arrival order
pub fn percents(progress: &[Notification]) -> Vec<u8> {
    progress
        .iter()
        .map(|n| match n {
            Notification::TransferProgress { percent, .. } => *percent,
            other => panic!("not a progress event: {:?}", other),
        })
        .collect()
}
