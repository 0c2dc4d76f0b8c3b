use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::debug;

use crate::auth::{CLOUD_PLATFORM_SCOPE, ServiceAccount, TokenProvider};
use crate::store::{ObjectStore, UploadRequest};

const STORAGE_UPLOAD_API: &str = "https://storage.googleapis.com/upload/storage/v1";
const MULTIPART_BOUNDARY: &str = "firesync-object-boundary-5c1f0e7a9b";
const REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata<'a> {
    name: &'a str,
    content_type: &'a str,
    cache_control: &'a str,
}

/// Cloud Storage client performing single-request multipart uploads.
pub struct StorageClient {
    http: Client,
    auth: TokenProvider,
    bucket: String,
}

impl StorageClient {
    pub fn new(account: ServiceAccount, bucket: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build storage http client")?;
        let auth = TokenProvider::new(http.clone(), account, CLOUD_PLATFORM_SCOPE);

        Ok(Self { http, auth, bucket })
    }
}

impl ObjectStore for StorageClient {
    fn upload(&mut self, request: &UploadRequest<'_>) -> Result<()> {
        let url = format!("{STORAGE_UPLOAD_API}/b/{}/o", self.bucket);
        let body = multipart_body(request)?;
        let token = self.auth.bearer()?;

        let mut query = vec![("uploadType", "multipart")];
        if request.public {
            query.push(("predefinedAcl", "publicRead"));
        }

        let response = self
            .http
            .post(&url)
            .query(&query)
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .with_context(|| format!("failed to send upload for {}", request.remote_path))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            bail!(
                "upload of {} to bucket {} failed with {status}: {detail}",
                request.remote_path,
                self.bucket
            );
        }

        debug!(remote_path = %request.remote_path, bucket = %self.bucket, "object stored");
        Ok(())
    }
}

/// Builds a `multipart/related` body: JSON metadata part, then the media part.
fn multipart_body(request: &UploadRequest<'_>) -> Result<Vec<u8>> {
    let metadata = serde_json::to_vec(&ObjectMetadata {
        name: request.remote_path,
        content_type: request.content_type,
        cache_control: request.cache_control,
    })
    .with_context(|| format!("failed to encode metadata for {}", request.remote_path))?;

    let mut body = Vec::with_capacity(request.body.len() + metadata.len() + 256);
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(&metadata);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", request.content_type).as_bytes());
    body.extend_from_slice(request.body);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Ok(body)
}
