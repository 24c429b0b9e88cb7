// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

// Common types for Desktop Remote

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::response::{string_field, JsonMap};

/// Handle identifying one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Direction of a file transfer, used to label progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Download,
    Upload,
}

/// Mouse button understood by the companion server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Simulated mouse action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    /// Move the pointer to an absolute desktop position
    Move { x: i32, y: i32 },
    Click { x: i32, y: i32, button: MouseButton },
    DoubleClick { x: i32, y: i32 },
    /// Scroll by a number of wheel units (positive is up)
    Scroll { amount: i32 },
}

/// Wire body for `POST /desktop/mouse`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseRequest {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default)]
    pub button: MouseButton,
}

impl From<MouseEvent> for MouseRequest {
    fn from(event: MouseEvent) -> Self {
        let (action, x, y, button) = match event {
            MouseEvent::Move { x, y } => ("move", Some(x), Some(y), MouseButton::Left),
            MouseEvent::Click { x, y, button } => ("click", Some(x), Some(y), button),
            MouseEvent::DoubleClick { x, y } => ("doubleclick", Some(x), Some(y), MouseButton::Left),
            // The server reads the scroll amount from `y`
            MouseEvent::Scroll { amount } => ("scroll", None, Some(amount), MouseButton::Left),
        };
        Self {
            action: action.to_string(),
            x,
            y,
            button,
        }
    }
}

/// Simulated keyboard input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardInput {
    /// Type a string of text
    Text(String),
    /// Press a single named key (enter, backspace, tab, ...)
    Key(String),
}

/// Wire body for `POST /desktop/keyboard`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl From<KeyboardInput> for KeyboardRequest {
    fn from(input: KeyboardInput) -> Self {
        match input {
            KeyboardInput::Text(text) => Self {
                text: Some(text),
                key: None,
            },
            KeyboardInput::Key(key) => Self {
                text: None,
                key: Some(key),
            },
        }
    }
}

/// Wire body for `POST /files/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    /// Base64-encoded file content
    pub data: String,
}

/// Desktop capture returned by `/desktop/screenshot`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    /// Base64-encoded image
    pub image: String,
    #[serde(default = "default_image_format")]
    pub format: String,
    /// Original desktop size
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Size of the (possibly downscaled) transmitted image
    #[serde(default)]
    pub thumbnail_width: u32,
    #[serde(default)]
    pub thumbnail_height: u32,
}

fn default_image_format() -> String {
    "jpeg".to_string()
}

impl Screenshot {
    pub fn from_map(map: JsonMap) -> Result<Self> {
        serde_json::from_value(Value::Object(map)).map_err(|e| {
            crate::Error::Protocol(format!("Invalid screenshot response: {}", e))
        })
    }

    /// Raw image bytes
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        use base64::Engine;
        Ok(base64::engine::general_purpose::STANDARD.decode(self.image.as_bytes())?)
    }

    /// File extension matching the image format
    pub fn extension(&self) -> &str {
        match self.format.as_str() {
            "jpeg" => "jpg",
            other => other,
        }
    }
}

/// System metrics reported by `/metrics`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemMetrics {
    pub hostname: String,
    pub uptime: String,
    /// CPU usage in percent, when the server reported a number
    pub cpu_percent: Option<f64>,
    pub ram: String,
    pub temperature: String,
}

impl SystemMetrics {
    /// Lenient view over a metrics map; unknown or missing fields are tolerated
    pub fn from_map(map: &JsonMap) -> Self {
        Self {
            hostname: display_field(map, "hostname").unwrap_or_else(|| "Unknown".to_string()),
            uptime: display_field(map, "uptime").unwrap_or_else(|| "Unknown".to_string()),
            cpu_percent: map.get("cpu").and_then(number_like),
            ram: display_field(map, "ram").unwrap_or_else(|| "Unknown".to_string()),
            temperature: display_field(map, "temperature").unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
    /// Modification time, seconds since the Unix epoch
    #[serde(default)]
    pub modified: i64,
}

/// Directory listing returned by `/files/list`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileListing {
    /// Listed directory, relative to the server's file root
    pub path: String,
    /// Parent directory, absent at the file root
    pub parent: Option<String>,
    pub items: Vec<FileItem>,
}

impl FileListing {
    /// Lenient view over a listing map; malformed items are skipped
    pub fn from_map(map: &JsonMap) -> Self {
        let items = map
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            path: string_field(map, "path").unwrap_or_else(|| "/".to_string()),
            parent: string_field(map, "parent"),
            items,
        }
    }
}

fn display_field(map: &JsonMap, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::parse_body;

    #[test]
    fn test_mouse_request_shapes() {
        let click: MouseRequest = MouseEvent::Click {
            x: 10,
            y: 20,
            button: MouseButton::Right,
        }
        .into();
        assert_eq!(
            serde_json::to_value(&click).unwrap(),
            serde_json::json!({"action": "click", "x": 10, "y": 20, "button": "right"})
        );

        let scroll: MouseRequest = MouseEvent::Scroll { amount: -3 }.into();
        assert_eq!(
            serde_json::to_value(&scroll).unwrap(),
            serde_json::json!({"action": "scroll", "y": -3, "button": "left"})
        );
    }

    #[test]
    fn test_keyboard_request_shapes() {
        let text: KeyboardRequest = KeyboardInput::Text("hello".into()).into();
        assert_eq!(
            serde_json::to_value(&text).unwrap(),
            serde_json::json!({"text": "hello"})
        );
        let key: KeyboardRequest = KeyboardInput::Key("enter".into()).into();
        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            serde_json::json!({"key": "enter"})
        );
    }

    #[test]
    fn test_system_metrics_from_server_shape() {
        let map = parse_body(
            r#"{"success":true,"hostname":"desk","uptime":"2 hours","cpu":"12.5",
                 "ram":"3.1Gi/15Gi","temperature":"48.0°C"}"#
                .as_bytes(),
        )
        .unwrap();
        let metrics = SystemMetrics::from_map(&map);
        assert_eq!(metrics.hostname, "desk");
        assert_eq!(metrics.cpu_percent, Some(12.5));
        assert_eq!(metrics.temperature, "48.0°C");

        let sparse = parse_body(br#"{"success":true,"cpu":42}"#).unwrap();
        let metrics = SystemMetrics::from_map(&sparse);
        assert_eq!(metrics.cpu_percent, Some(42.0));
        assert_eq!(metrics.hostname, "Unknown");
        assert_eq!(metrics.temperature, "N/A");
    }

    #[test]
    fn test_file_listing_from_server_shape() {
        let map = parse_body(
            br#"{"success":true,"path":"/Documents","parent":"/","items":[
                {"name":"notes","is_dir":true,"size":0,"modified":1700000000},
                {"name":"a.txt","is_dir":false,"size":5,"modified":1700000001},
                {"bogus":true}
            ]}"#,
        )
        .unwrap();
        let listing = FileListing::from_map(&map);
        assert_eq!(listing.path, "/Documents");
        assert_eq!(listing.parent.as_deref(), Some("/"));
        assert_eq!(listing.items.len(), 2);
        assert!(listing.items[0].is_dir);
        assert_eq!(listing.items[1].size, 5);

        let root = parse_body(br#"{"success":true,"path":"/","parent":null,"items":[]}"#).unwrap();
        assert_eq!(FileListing::from_map(&root).parent, None);
    }

    #[test]
    fn test_screenshot_decode() {
        let map = parse_body(
            br#"{"success":true,"image":"/9j/","format":"jpeg","width":1920,"height":1080,
                 "thumbnail_width":1280,"thumbnail_height":720}"#,
        )
        .unwrap();
        let shot = Screenshot::from_map(map).unwrap();
        assert_eq!(shot.width, 1920);
        assert_eq!(shot.extension(), "jpg");
        assert_eq!(shot.decode_image().unwrap(), vec![0xff, 0xd8, 0xff]);
    }
}
