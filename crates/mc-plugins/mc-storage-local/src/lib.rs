//! # mc-storage-local
//!
//! Local filesystem implementation of `MediaStore`.
//! Objects live under `<root>/<bucket>/<path>` and are served by the API
//! under `<public_prefix>/<bucket>/<path>`.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use mc_core::MediaStore;
use tokio::fs;
use tracing::debug;

pub struct LocalMediaStore {
    /// Root directory for all buckets (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Bucket holding listing images (e.g., "listing-images")
    bucket: String,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, bucket: impl Into<String>, url_prefix: impl Into<String>) -> Self {
        Self {
            root_path: root,
            bucket: bucket.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolves an object path inside the bucket, refusing anything that
    /// would escape it.
    fn object_path(&self, path: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            bail!("invalid object path {path:?}");
        }
        Ok(self.root_path.join(&self.bucket).join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        content_type: &mime::Mime,
    ) -> anyhow::Result<String> {
        // 1. Security Check: the bytes must actually be an image
        if content_type.type_() != mime::IMAGE {
            bail!("refusing non-image content type {content_type}");
        }
        image::guess_format(&data).context("uploaded bytes are not a recognised image")?;

        // 2. Ensure directory exists
        let target_path = self.object_path(path)?;
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // 3. Save
        fs::write(&target_path, &data)
            .await
            .with_context(|| format!("writing {}", target_path.display()))?;
        debug!(path, bytes = data.len(), "object stored");

        Ok(self.public_url(path))
    }

    async fn remove(&self, path: &str) -> anyhow::Result<()> {
        let target_path = self.object_path(path)?;
        match fs::remove_file(&target_path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {}", target_path.display())),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.url_prefix, self.bucket, path)
    }
}
