// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local resource picking (host-provided file chooser).

use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Opaque reference to a resource the user picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host resource chooser.
#[async_trait]
pub trait ResourcePicker: Send + Sync {
    /// Let the user choose a resource matching `mime_filter` (e.g. `image/*`).
    ///
    /// `None` means the user cancelled.
    async fn pick(&self, mime_filter: &str) -> Option<ResourceHandle>;

    /// Read the full content of a picked resource.
    async fn read_all(&self, handle: &ResourceHandle) -> Result<Vec<u8>, AppError>;
}

/// Picker over the local filesystem.
///
/// Headless hosts have no dialog, so the "choice" is queued up front with
/// [`FileResourcePicker::queue`]; `pick` hands out queued paths in order.
#[derive(Default)]
pub struct FileResourcePicker {
    queued: Mutex<Vec<PathBuf>>,
}

impl FileResourcePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a path to be returned by the next `pick`.
    pub fn queue(&self, path: impl AsRef<Path>) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.as_ref().to_path_buf());
    }
}

#[async_trait]
impl ResourcePicker for FileResourcePicker {
    async fn pick(&self, mime_filter: &str) -> Option<ResourceHandle> {
        let mut queued = self.queued.lock().unwrap_or_else(PoisonError::into_inner);
        if queued.is_empty() {
            return None;
        }
        let path = queued.remove(0);
        tracing::debug!(path = %path.display(), mime_filter, "Resource picked");
        Some(ResourceHandle::new(path.to_string_lossy()))
    }

    async fn read_all(&self, handle: &ResourceHandle) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(handle.as_str())
            .await
            .map_err(|e| AppError::NotFound(format!("{}: {}", handle, e)))
    }
}
