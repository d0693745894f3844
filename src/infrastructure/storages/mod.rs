pub mod local;
pub mod s3;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{repositories::storage::FileStorage, value_objects::submissions::UploadedFile};

/// Evidence storage picked at startup from `FILE_STORAGE`.
pub enum SubmissionFileStorage {
    Local(local::LocalFileStorage),
    S3(s3::S3FileStorage),
}

#[async_trait]
impl FileStorage for SubmissionFileStorage {
    async fn put(&self, file: UploadedFile) -> Result<String> {
        match self {
            SubmissionFileStorage::Local(storage) => storage.put(file).await,
            SubmissionFileStorage::S3(storage) => storage.put(file).await,
        }
    }
}

/// `{millis}-{random}-{name}` with anything outside `[A-Za-z0-9._-]`
/// replaced, so uploads never escape the target directory or prefix.
fn object_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut sanitized = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    if sanitized.trim_matches('.').is_empty() {
        sanitized = "upload".to_string();
    }
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &suffix[..8],
        sanitized
    )
}

/// Browsers often send `application/octet-stream`; fall back to the extension.
fn content_type_for(file: &UploadedFile) -> String {
    let declared = file.content_type.trim();
    if declared.is_empty() || declared == "application/octet-stream" {
        mime_guess::from_path(&file.file_name)
            .first_or_octet_stream()
            .to_string()
    } else {
        declared.to_string()
    }
}
