//! Media picker backed by the local filesystem
//!
//! Stands in for an `<input type="file" accept="image/*">`: the caller
//! offers a path (the user's pick), and [`MediaPicker::choose`] reads and
//! validates it. Each trigger forgets the previous choice first, so picking
//! the same file twice still produces a fresh selection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use treetracker_core::validation::content_type_for_path;
use treetracker_core::{MediaAsset, MediaPicker, MediaValidator, PickError};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub struct FileMediaPicker {
    validator: MediaValidator,
    offered: Option<PathBuf>,
    current: Option<MediaAsset>,
}

impl FileMediaPicker {
    pub fn new(validator: MediaValidator) -> Self {
        Self {
            validator,
            offered: None,
            current: None,
        }
    }

    /// Queue the file the next `choose` call will pick.
    pub fn offer(&mut self, path: impl Into<PathBuf>) {
        self.offered = Some(path.into());
    }

    /// The last accepted pick, if the latest trigger produced one.
    pub fn current(&self) -> Option<&MediaAsset> {
        self.current.as_ref()
    }

    async fn load(&self, path: &Path) -> Result<MediaAsset, PickError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = content_type_for_path(path).unwrap_or(FALLBACK_CONTENT_TYPE);

        // reject on metadata before reading a large file into memory
        let size = tokio::fs::metadata(path).await?.len();
        self.validator.validate_file_size(size)?;
        self.validator.validate_content_type(content_type)?;

        let data = Bytes::from(tokio::fs::read(path).await?);
        self.validator
            .validate_all(&name, content_type, data.len() as u64)?;

        Ok(MediaAsset::new(name, content_type, data))
    }
}

#[async_trait]
impl MediaPicker for FileMediaPicker {
    async fn choose(&mut self) -> Result<Option<MediaAsset>, PickError> {
        self.current = None;

        let Some(path) = self.offered.take() else {
            tracing::debug!("Media pick cancelled");
            return Ok(None);
        };

        match self.load(&path).await {
            Ok(asset) => {
                tracing::debug!(
                    path = %path.display(),
                    content_type = %asset.content_type,
                    size_bytes = asset.size_bytes,
                    "Media picked"
                );
                self.current = Some(asset.clone());
                Ok(Some(asset))
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Media pick rejected");
                Err(e)
            }
        }
    }
}
