//! # Image Upload Orchestrator
//!
//! Persists a poster's images to the object store, one after another, and
//! hands back their public URLs in the order the images were given.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use mc_core::{AppError, ImageBlob, MediaStore, Result};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// An image that made it into the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub path: String,
    pub url: String,
}

pub struct ImageUploader {
    store: Arc<dyn MediaStore>,
}

impl ImageUploader {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// Uploads every image under `{owner}/{millis}_{index}.{ext}`.
    ///
    /// Stops at the first failure. Images already stored by this call are
    /// removed again before the `Upload` error is returned.
    pub async fn upload_all(
        &self,
        owner_id: Uuid,
        images: &[ImageBlob],
    ) -> Result<Vec<StoredImage>> {
        let batch = Utc::now().timestamp_millis();
        let mut stored = Vec::with_capacity(images.len());

        for (index, image) in images.iter().enumerate() {
            let path = format!("{owner_id}/{batch}_{index}.{}", extension_for(image));

            match self.store.put(&path, image.data.clone(), &image.content_type).await {
                Ok(url) => {
                    debug!(%owner_id, %path, "image stored");
                    stored.push(StoredImage { path, url });
                }
                Err(err) => {
                    warn!(%owner_id, %path, error = %err, "image upload failed");
                    self.discard(&stored).await;
                    return Err(AppError::Upload(format!("{}: {err:#}", image.file_name)));
                }
            }
        }

        Ok(stored)
    }

    /// Best-effort removal of stored images. Failures are logged, not returned.
    pub async fn discard(&self, images: &[StoredImage]) {
        for image in images {
            if let Err(err) = self.store.remove(&image.path).await {
                warn!(path = %image.path, error = %err, "could not remove orphaned image");
            }
        }
    }

    /// Removes objects by storage path, as recorded on photo rows.
    pub async fn discard_paths<'a>(&self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            if let Err(err) = self.store.remove(path).await {
                warn!(%path, error = %err, "could not remove image");
            }
        }
    }
}

/// The file name's extension, else one registered for the content type.
fn extension_for(image: &ImageBlob) -> String {
    Path::new(&image.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .or_else(|| {
            mime_guess::get_mime_extensions(&image.content_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "bin".to_string())
}
