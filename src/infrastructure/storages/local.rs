use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::domain::value_objects::submissions::UploadedFile;

use super::object_name;

/// Writes uploads into a directory that a static file server exposes under
/// `public_base_url`.
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub async fn new(root: PathBuf, public_base_url: String) -> Result<Self> {
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("failed to create upload dir {}", root.display()))?;

        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn put(&self, file: UploadedFile) -> Result<String> {
        let name = object_name(&file.file_name);
        let path = self.root.join(&name);

        // create_new: an existing object is an error, never overwritten.
        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to create upload {}", path.display()))?;
        out.write_all(&file.bytes)
            .await
            .with_context(|| format!("failed to write upload {}", path.display()))?;
        out.flush()
            .await
            .with_context(|| format!("failed to flush upload {}", path.display()))?;

        info!(file = %name, size = file.bytes.len(), "storage: stored upload locally");
        Ok(format!("{}/{}", self.public_base_url, name))
    }
}
