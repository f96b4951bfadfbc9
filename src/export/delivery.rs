//! File delivery collaborators.
//!
//! Delivery is fire-and-forget from the pipeline's point of view: once the
//! collaborator accepts the payload, the export is done.

use crate::error::ChartyError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Receives an encoded export and saves it somewhere.
#[async_trait]
pub trait FileDelivery: Send + Sync {
    async fn deliver(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), ChartyError>;
}

/// Writes exports into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FileDelivery for DirectoryDelivery {
    async fn deliver(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), ChartyError> {
        // Filenames come from the sanitizer, but never let one escape the dir
        if filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(ChartyError::Delivery(format!(
                "refusing to write '{}' outside the export directory",
                filename
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            ChartyError::Delivery(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let path = self.dir.join(filename);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| ChartyError::Delivery(format!("cannot write {}: {}", path.display(), e)))?;

        tracing::info!(
            path = %path.display(),
            content_type = content_type,
            bytes = data.len(),
            "Export delivered"
        );
        Ok(())
    }
}

/// A delivered file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Keeps deliveries in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    files: Mutex<Vec<DeliveredFile>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<DeliveredFile> {
        self.files.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

#[async_trait]
impl FileDelivery for MemoryDelivery {
    async fn deliver(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), ChartyError> {
        self.files.lock().push(DeliveredFile {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }
}
