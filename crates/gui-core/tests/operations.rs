// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! Request/response behaviour of the non-transfer operations

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Value};

use common::{client, client_with, closed_port, spawn_server, until_terminal};
use desktop_remote_gui_core::{
    ClientConfig, KeyboardInput, MouseButton, MouseEvent, Notification, Operation, SystemMetrics,
};

#[tokio::test]
async fn metrics_success_strips_discriminator_and_sends_token() {
    let seen: Arc<Mutex<Option<HeaderMap>>> = Arc::default();
    let recorded = seen.clone();
    let app = Router::new().route(
        "/metrics",
        get(move |headers: HeaderMap| async move {
            *recorded.lock().unwrap() = Some(headers);
            Json(json!({"success": true, "cpu": 42}))
        }),
    );
    let addr = spawn_server(app).await;

    let (client, mut rx) = client();
    let request = client.fetch_metrics("127.0.0.1", "", "secret", addr.port());

    let (progress, terminal) = until_terminal(&mut rx).await;
    assert!(progress.is_empty());
    match terminal {
        Notification::MetricsReceived {
            request: id,
            metrics,
        } => {
            assert_eq!(id, request);
            assert_eq!(Value::Object(metrics.clone()), json!({"cpu": 42}));
            assert_eq!(SystemMetrics::from_map(&metrics).cpu_percent, Some(42.0));
        }
        other => panic!("unexpected notification: {:?}", other),
    }

    let headers = seen.lock().unwrap().take().unwrap();
    assert_eq!(headers[header::AUTHORIZATION], "Bearer secret");
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
}

#[tokio::test]
async fn metrics_without_token_sends_no_authorization() {
    let seen: Arc<Mutex<Option<HeaderMap>>> = Arc::default();
    let recorded = seen.clone();
    let app = Router::new().route(
        "/metrics",
        get(move |headers: HeaderMap| async move {
            *recorded.lock().unwrap() = Some(headers);
            Json(json!({"success": true}))
        }),
    );
    let addr = spawn_server(app).await;

    let (client, mut rx) = client();
    client.fetch_metrics("127.0.0.1", "user", "", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(terminal.is_success());

    let headers = seen.lock().unwrap().take().unwrap();
    assert!(headers.get(header::AUTHORIZATION).is_none());
}

#[tokio::test]
async fn configured_token_is_sent_on_every_request() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let recorded = seen.clone();
    let app = Router::new().route(
        "/files/list",
        get(move |headers: HeaderMap| async move {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            recorded.lock().unwrap().push(auth);
            Json(json!({"success": true, "path": "", "items": []}))
        }),
    );
    let addr = spawn_server(app).await;

    let (client, mut rx) = client_with(ClientConfig {
        auth_token: "from-config".into(),
        ..ClientConfig::default()
    });
    client.list_files("127.0.0.1", addr.port(), "");
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(terminal, Notification::FileListReceived { .. }));

    assert_eq!(*seen.lock().unwrap(), vec!["Bearer from-config".to_string()]);
}

#[tokio::test]
async fn connection_refused_is_reported_once() {
    let port = closed_port().await;
    let (client, mut rx) = client();

    let request = client.fetch_metrics("127.0.0.1", "", "", port);
    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::OperationFailed {
            request: id,
            operation,
            error,
        } => {
            assert_eq!(id, request);
            assert_eq!(operation, Operation::FetchMetrics);
            assert!(error.contains("Connection refused"), "{}", error);
        }
        other => panic!("unexpected notification: {:?}", other),
    }

    // The client stays usable and nothing else was emitted
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
    assert!(client.in_flight().is_empty());
}

#[tokio::test]
async fn transport_failure_maps_to_each_operation_contract() {
    let port = closed_port().await;
    let (client, mut rx) = client();

    client.shutdown_host("127.0.0.1", port);
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(
        terminal,
        Notification::ShutdownCompleted { success: false, .. }
    ));

    client.send_mouse_event("127.0.0.1", port, MouseEvent::Move { x: 1, y: 1 });
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(
        terminal,
        Notification::MouseControlResult { success: false, .. }
    ));

    client.send_keyboard_input("127.0.0.1", port, KeyboardInput::Key("enter".into()));
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(
        terminal,
        Notification::KeyboardInputResult { success: false, .. }
    ));

    client.capture_screen("127.0.0.1", port);
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(
        terminal,
        Notification::OperationFailed {
            operation: Operation::CaptureScreen,
            ..
        }
    ));
}

#[tokio::test]
async fn transport_failure_on_file_operations_is_reported_once() {
    let port = closed_port().await;
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("notes.txt");
    std::fs::write(&source, b"some notes").unwrap();
    let target = dir.path().join("downloaded.txt");
    let (client, mut rx) = client();

    let requests = [
        (client.list_files("127.0.0.1", port, "docs"), Operation::ListFiles),
        (
            client.download_file("127.0.0.1", port, "/notes.txt", &target),
            Operation::DownloadFile,
        ),
        (
            client.upload_file("127.0.0.1", port, &source, "/remote"),
            Operation::UploadFile,
        ),
    ];

    let mut failed = Vec::new();
    for _ in 0..requests.len() {
        let (progress, terminal) = until_terminal(&mut rx).await;
        assert!(progress.is_empty(), "unexpected progress: {:?}", progress);
        match terminal {
            Notification::FileOperationFailed {
                request,
                operation,
                error,
            } => {
                assert!(error.contains("Connection refused"), "{}", error);
                failed.push((request, operation));
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    for expected in &requests {
        assert!(failed.contains(expected), "no failure for {:?}", expected);
    }

    // Nothing trails the terminal notifications
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
    assert!(!target.exists());
    assert!(client.in_flight().is_empty());
}

#[tokio::test]
async fn missing_success_is_failure() {
    let app = Router::new().route("/metrics", get(|| async { Json(json!({"cpu": 10})) }));
    let addr = spawn_server(app).await;

    let (client, mut rx) = client();
    client.fetch_metrics("127.0.0.1", "", "", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::OperationFailed { error, .. } => {
            assert_eq!(error, "Server returned unsuccessful response");
        }
        other => panic!("unexpected notification: {:?}", other),
    }
}

#[tokio::test]
async fn invalid_json_is_protocol_failure() {
    let app = Router::new().route("/metrics", get(|| async { "definitely not json" }));
    let addr = spawn_server(app).await;

    let (client, mut rx) = client();
    client.fetch_metrics("127.0.0.1", "", "", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::OperationFailed { error, .. } => {
            assert!(error.starts_with("Invalid response from server"), "{}", error);
        }
        other => panic!("unexpected notification: {:?}", other),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let app = Router::new().route(
        "/metrics",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"success": false, "error": "Unauthorized"})),
            )
        }),
    );
    let addr = spawn_server(app).await;

    let (client, mut rx) = client();
    client.fetch_metrics("127.0.0.1", "", "wrong", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::OperationFailed { error, .. } => {
            assert_eq!(error, "Authentication failed. Check your token.");
        }
        other => panic!("unexpected notification: {:?}", other),
    }
}

#[tokio::test]
async fn shutdown_messages() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = calls.clone();
    let app = Router::new().route(
        "/shutdown",
        get(move || async move {
            let call = {
                let mut calls = counter.lock().unwrap();
                *calls += 1;
                *calls
            };
            match call {
                1 => Json(json!({"success": true})),
                2 => Json(json!({"success": false, "message": "Shutdown not permitted"})),
                _ => Json(json!({"success": false})),
            }
        }),
    );
    let addr = spawn_server(app).await;
    let (client, mut rx) = client();

    client.shutdown_host("127.0.0.1", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(
        terminal,
        Notification::ShutdownCompleted { success: true, ref message, .. } if message == "Shutdown initiated"
    ));

    client.shutdown_host("127.0.0.1", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(
        terminal,
        Notification::ShutdownCompleted { success: false, ref message, .. } if message == "Shutdown not permitted"
    ));

    client.shutdown_host("127.0.0.1", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(
        terminal,
        Notification::ShutdownCompleted { success: false, ref message, .. } if message == "Shutdown failed"
    ));
}

#[tokio::test]
async fn error_status_is_failure_even_when_body_claims_success() {
    let app = Router::new().route(
        "/metrics",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": true, "cpu": 1})),
            )
        }),
    );
    let addr = spawn_server(app).await;

    let (client, mut rx) = client();
    client.fetch_metrics("127.0.0.1", "", "", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::OperationFailed { error, .. } => {
            assert_eq!(error, "Network error: HTTP 500");
        }
        other => panic!("unexpected notification: {:?}", other),
    }
}

#[tokio::test]
async fn concurrent_requests_route_to_their_own_notifications() {
    let app = Router::new()
        .route(
            "/shutdown",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({"success": true, "message": "Shutting down in 5 seconds"}))
            }),
        )
        .route(
            "/files/list",
            get(|| async { Json(json!({"success": true, "path": "docs", "items": []})) }),
        );
    let addr = spawn_server(app).await;
    let (client, mut rx) = client();

    let shutdown = client.shutdown_host("127.0.0.1", addr.port());
    let list = client.list_files("127.0.0.1", addr.port(), "docs");
    assert_eq!(client.in_flight().len(), 2);

    let (_, first) = until_terminal(&mut rx).await;
    let (_, second) = until_terminal(&mut rx).await;

    for terminal in [first, second] {
        match terminal {
            Notification::ShutdownCompleted {
                request,
                success,
                message,
            } => {
                assert_eq!(request, shutdown);
                assert!(success);
                assert_eq!(message, "Shutting down in 5 seconds");
            }
            Notification::FileListReceived { request, listing } => {
                assert_eq!(request, list);
                assert_eq!(listing["path"], "docs");
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }
    assert!(client.in_flight().is_empty());
}

#[tokio::test]
async fn request_timeout_is_enforced() {
    let app = Router::new().route(
        "/desktop/screenshot",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"success": true}))
        }),
    );
    let addr = spawn_server(app).await;
    let (client, mut rx) = client_with(ClientConfig {
        request_timeout_secs: 1,
        ..ClientConfig::default()
    });

    client.capture_screen("127.0.0.1", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::OperationFailed { operation, error, .. } => {
            assert_eq!(operation, Operation::CaptureScreen);
            assert_eq!(error, "Connection timed out. Check your network connection.");
        }
        other => panic!("unexpected notification: {:?}", other),
    }
}

#[tokio::test]
async fn cancelled_request_emits_one_failure() {
    let app = Router::new().route(
        "/files/list",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(json!({"success": true}))
        }),
    );
    let addr = spawn_server(app).await;
    let (client, mut rx) = client();

    let request = client.list_files("127.0.0.1", addr.port(), "/");
    assert_eq!(client.in_flight(), vec![(request, Operation::ListFiles)]);
    assert!(client.cancel(request));

    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::FileOperationFailed {
            request: id, error, ..
        } => {
            assert_eq!(id, request);
            assert_eq!(error, "Request cancelled");
        }
        other => panic!("unexpected notification: {:?}", other),
    }
    assert!(client.in_flight().is_empty());
    assert!(!client.cancel(request));
}

#[tokio::test]
async fn cancel_all_resolves_everything() {
    let app = Router::new().route(
        "/metrics",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(json!({"success": true}))
        }),
    );
    let addr = spawn_server(app).await;
    let (client, mut rx) = client();

    for _ in 0..3 {
        client.fetch_metrics("127.0.0.1", "", "", addr.port());
    }
    client.cancel_all();

    for _ in 0..3 {
        let (_, terminal) = until_terminal(&mut rx).await;
        assert!(matches!(terminal, Notification::OperationFailed { ref error, .. } if error == "Request cancelled"));
    }
    assert!(client.in_flight().is_empty());
}

#[tokio::test]
async fn screenshot_is_decoded() {
    let image = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG fake image");
    let app = Router::new().route(
        "/desktop/screenshot",
        get(move || async move {
            Json(json!({
                "success": true,
                "image": image,
                "format": "png",
                "width": 1920,
                "height": 1080,
                "thumbnail_width": 960,
                "thumbnail_height": 540
            }))
        }),
    );
    let addr = spawn_server(app).await;
    let (client, mut rx) = client();

    client.capture_screen("127.0.0.1", addr.port());
    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::ScreenshotReady { screenshot, .. } => {
            assert_eq!(screenshot.decode_image().unwrap(), b"\x89PNG fake image");
            assert_eq!(screenshot.extension(), "png");
            assert_eq!((screenshot.width, screenshot.height), (1920, 1080));
            assert_eq!(screenshot.thumbnail_width, 960);
        }
        other => panic!("unexpected notification: {:?}", other),
    }
}

#[tokio::test]
async fn mouse_events_use_the_wire_shape() {
    let bodies: Arc<Mutex<Vec<Value>>> = Arc::default();
    let recorded = bodies.clone();
    let app = Router::new().route(
        "/desktop/mouse",
        post(move |Json(body): Json<Value>| async move {
            recorded.lock().unwrap().push(body);
            Json(json!({"success": true, "message": "Mouse action performed"}))
        }),
    );
    let addr = spawn_server(app).await;
    let (client, mut rx) = client();

    client.send_mouse_event(
        "127.0.0.1",
        addr.port(),
        MouseEvent::Click {
            x: 10,
            y: 20,
            button: MouseButton::Right,
        },
    );
    let (_, terminal) = until_terminal(&mut rx).await;
    assert!(matches!(
        terminal,
        Notification::MouseControlResult { success: true, ref message, .. } if message == "Mouse action performed"
    ));

    client.send_mouse_event("127.0.0.1", addr.port(), MouseEvent::Scroll { amount: -3 });
    until_terminal(&mut rx).await;

    assert_eq!(
        *bodies.lock().unwrap(),
        vec![
            json!({"action": "click", "x": 10, "y": 20, "button": "right"}),
            json!({"action": "scroll", "y": -3, "button": "left"}),
        ]
    );
}

#[tokio::test]
async fn keyboard_failure_carries_server_error() {
    let bodies: Arc<Mutex<Vec<Value>>> = Arc::default();
    let recorded = bodies.clone();
    let app = Router::new().route(
        "/desktop/keyboard",
        post(move |Json(body): Json<Value>| async move {
            recorded.lock().unwrap().push(body);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": "xdotool not installed"})),
            )
                .into_response()
        }),
    );
    let addr = spawn_server(app).await;
    let (client, mut rx) = client();

    client.send_keyboard_input(
        "127.0.0.1",
        addr.port(),
        KeyboardInput::Text("hello".into()),
    );
    let (_, terminal) = until_terminal(&mut rx).await;
    match terminal {
        Notification::KeyboardInputResult {
            success, message, ..
        } => {
            assert!(!success);
            assert_eq!(message, "xdotool not installed");
        }
        other => panic!("unexpected notification: {:?}", other),
    }
    assert_eq!(*bodies.lock().unwrap(), vec![json!({"text": "hello"})]);
}
