// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! File transfer helpers: progress accounting and local file I/O

use std::io::ErrorKind;
use std::path::Path;

use base64::Engine;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use desktop_remote_common::{Error, Result, UploadRequest};

/// Size of the chunks an upload body is streamed in
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Integer percentage tracker for one transfer
///
/// Only reports a value when the percentage increases, so reported values
/// are strictly increasing and never exceed 100. Unknown or zero totals
/// never report.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: Option<u64>,
    done: u64,
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            done: 0,
            last: None,
        }
    }

    /// Account for `bytes` more bytes and return the new percentage, if it changed
    pub fn advance(&mut self, bytes: u64) -> Option<u8> {
        let total = self.total?;
        self.done = self.done.saturating_add(bytes);

        let done = self.done.min(total) as u128;
        let percent = (done * 100 / total as u128) as u8;

        if self.last.map_or(true, |last| percent > last) {
            self.last = Some(percent);
            Some(percent)
        } else {
            None
        }
    }
}

/// Read a local file for upload and build the JSON request body
///
/// Fails with `FileNotFound` when the path does not exist, and with a
/// local I/O error when it cannot be read.
pub async fn prepare_upload(local_path: &Path) -> Result<UploadRequest> {
    match fs::metadata(local_path).await {
        Ok(meta) if meta.is_dir() => {
            return Err(Error::local_io(
                format!("Cannot upload {}", local_path.display()),
                std::io::Error::new(ErrorKind::InvalidInput, "is a directory"),
            ));
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::FileNotFound(local_path.display().to_string()));
        }
        Err(e) => {
            return Err(Error::local_io(
                format!("Cannot open file for reading: {}", local_path.display()),
                e,
            ));
        }
    }

    let data = fs::read(local_path).await.map_err(|e| {
        Error::local_io(
            format!("Cannot open file for reading: {}", local_path.display()),
            e,
        )
    })?;

    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| Error::FileNotFound(local_path.display().to_string()))?;

    debug!("Read {} bytes from {:?} for upload", data.len(), local_path);

    Ok(UploadRequest {
        filename,
        data: base64::engine::general_purpose::STANDARD.encode(&data),
    })
}

/// Decode a base64 payload
pub fn decode_payload(data: &str) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(data.trim().as_bytes())?)
}

/// Write downloaded bytes to `local_path`, creating missing parent directories
///
/// An existing file is overwritten. If writing fails after the file was
/// created, the partial file is removed.
pub async fn save_download(local_path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|e| {
            Error::local_io(format!("Cannot create directory {}", parent.display()), e)
        })?;
    }

    let mut file = fs::File::create(local_path).await.map_err(|e| {
        Error::local_io(
            format!("Cannot open file for writing: {}", local_path.display()),
            e,
        )
    })?;

    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = fs::remove_file(local_path).await {
            warn!(
                "Failed to remove partial download {:?}: {}",
                local_path, remove_err
            );
        }
        return Err(Error::local_io(
            format!("Cannot write file {}", local_path.display()),
            e,
        ));
    }

    Ok(())
}
