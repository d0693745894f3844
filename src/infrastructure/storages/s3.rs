use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, timeout::TimeoutConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{Region, StalledStreamProtectionConfig},
    error::{ProvideErrorMetadata, SdkError},
    operation::put_object::PutObjectError,
    primitives::ByteStream,
};
use http::Uri;
use tracing::info;

use crate::domain::value_objects::submissions::UploadedFile;

use super::{content_type_for, object_name};

#[derive(Debug, Clone)]
pub struct S3StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub prefix: String,
    /// Base the returned object URLs are built on, e.g. a CDN or the bucket's
    /// public endpoint.
    pub public_base_url: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

pub struct S3FileStorage {
    client: Client,
    bucket: String,
    prefix: String,
    public_base_url: String,
}

pub async fn build_s3_client(config: &S3StorageConfig) -> Result<Client> {
    let endpoint = format!("{}/", config.endpoint.trim_end_matches('/'));
    Uri::from_str(&endpoint).context("invalid s3 endpoint URL")?;

    let credentials = Credentials::new(
        config.access_key.clone(),
        config.secret_key.clone(),
        None,
        None,
        "s3-compatible",
    );

    let region = Region::new(config.region.clone());
    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region.clone())
        .credentials_provider(credentials)
        .timeout_config(
            TimeoutConfig::builder()
                .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
                .read_timeout(Duration::from_secs(config.read_timeout_secs))
                .build(),
        )
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
        .endpoint_url(endpoint)
        .force_path_style(true)
        .region(region)
        .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
        .build();

    Ok(Client::from_conf(s3_config))
}

impl S3FileStorage {
    pub async fn new(config: S3StorageConfig) -> Result<Self> {
        let client = build_s3_client(&config)
            .await
            .context("failed to build s3 client")?;

        Ok(Self {
            client,
            bucket: config.bucket,
            prefix: normalize_prefix(&config.prefix),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn put(&self, file: UploadedFile) -> Result<String> {
        let object_key = format!("{}{}", self.prefix, object_name(&file.file_name));
        let content_type = content_type_for(&file);
        let size = file.bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(file.bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| map_put_object_error(err, &self.bucket, &object_key))?;

        info!(bucket = %self.bucket, key = %object_key, size, "storage: stored upload in s3");
        Ok(format!("{}/{}", self.public_base_url, object_key))
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

fn map_put_object_error(
    err: SdkError<PutObjectError>,
    bucket: &str,
    object_key: &str,
) -> anyhow::Error {
    if let SdkError::ServiceError(service_err) = &err {
        let status = service_err.raw().status().as_u16();
        let code = service_err.err().code().unwrap_or("unknown");
        let message = service_err.err().message().unwrap_or_default();

        let mut detail = format!(
            "failed to upload submission file (status {}, code {})",
            status, code
        );
        if !message.is_empty() {
            detail.push_str(&format!(": {}", message));
        }
        detail.push_str(&format!(" [bucket={}, key={}]", bucket, object_key));

        return anyhow::anyhow!(detail);
    }

    anyhow::Error::new(err).context("failed to upload submission file")
}
