use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::submissions::UploadedFile;

#[async_trait]
#[automock]
pub trait FileStorage {
    /// Stores submission evidence and returns the URL it is served from.
    async fn put(&self, file: UploadedFile) -> Result<String>;
}
