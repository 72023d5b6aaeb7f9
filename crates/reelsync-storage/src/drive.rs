use crate::media::media_type_for;
use crate::multipart::{self, BatchPart, PartResponse};
use crate::traits::{RemoteStorage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use reelsync_auth::{AuthError, TokenProvider};
use reelsync_core::models::{PermissionGrant, RemoteBlob, RemoteContainer};
use reelsync_core::{DriveConfig, RemoteServiceError, UploadError};
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE, LOCATION, RANGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use uuid::Uuid;

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Deserialize)]
struct IdResponse {
    id: Option<String>,
}

/// Drive-compatible HTTP storage implementation
///
/// Containers are folders, blobs are files uploaded through resumable
/// sessions, permissions are created through the batch endpoint. Every
/// request asks the token provider for a current bearer token.
#[derive(Clone)]
pub struct DriveStorage {
    http: Client,
    api_base_url: String,
    upload_base_url: String,
    parent_folder_id: Option<String>,
    chunk_size: u64,
    max_resume_attempts: u32,
    tokens: Arc<dyn TokenProvider>,
}

impl DriveStorage {
    /// Create a new DriveStorage instance
    ///
    /// # Arguments
    /// * `config` - Endpoint, chunking and retry settings
    /// * `tokens` - Source of bearer tokens, consulted before every request
    pub fn new(config: &DriveConfig, tokens: Arc<dyn TokenProvider>) -> StorageResult<Self> {
        if config.chunk_size_bytes == 0 {
            return Err(StorageError::ConfigError(
                "Drive chunk size must be non-zero".to_string(),
            ));
        }

        // 308 is the resumable protocol's "incomplete" answer, not a redirect.
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(DriveStorage {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: config.upload_base_url.trim_end_matches('/').to_string(),
            parent_folder_id: config.parent_folder_id.clone(),
            chunk_size: config.chunk_size_bytes as u64,
            max_resume_attempts: config.max_resume_attempts,
            tokens,
        })
    }

    /// Send a request built around the current token. A `401` renews the
    /// token and sends the request once more.
    async fn send<F>(&self, build: F) -> Result<Response, RemoteServiceError>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let token = self.tokens.access_token().await.map_err(unauthorized)?;
        let response = build(&token).send().await.map_err(transport)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("Access token rejected, renewing and retrying once");
        let token = self.tokens.renew().await.map_err(unauthorized)?;
        build(&token).send().await.map_err(transport)
    }

    /// Open a resumable upload session and return its URI.
    async fn start_session(
        &self,
        container_id: &str,
        name: &str,
        media_type: &str,
        total: u64,
    ) -> Result<String, RemoteServiceError> {
        let url = format!(
            "{}/upload/drive/v3/files?uploadType=resumable&fields=id",
            self.upload_base_url
        );
        let metadata = json!({ "name": name, "parents": [container_id] });
        let response = self
            .send(|token| {
                bearer(self.http.post(&url), token)
                    .header("X-Upload-Content-Type", media_type)
                    .header("X-Upload-Content-Length", total)
                    .json(&metadata)
            })
            .await?;
        let response = ensure_success(response).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                RemoteServiceError::MalformedResponse(
                    "resumable session response has no Location header".to_string(),
                )
            })
    }

    async fn put_chunk(
        &self,
        session_uri: &str,
        chunk: Bytes,
        offset: u64,
        total: u64,
    ) -> Result<Response, RemoteServiceError> {
        let range = if chunk.is_empty() {
            format!("bytes */{}", total)
        } else {
            format!("bytes {}-{}/{}", offset, offset + chunk.len() as u64 - 1, total)
        };
        self.send(|token| {
            bearer(self.http.put(session_uri), token)
                .header(CONTENT_RANGE, range.as_str())
                .body(chunk.clone())
        })
        .await
    }

    /// Ask the session how many bytes it has committed.
    async fn query_session(&self, session_uri: &str, total: u64) -> Result<Response, RemoteServiceError> {
        let range = format!("bytes */{}", total);
        self.send(|token| {
            bearer(self.http.put(session_uri), token)
                .header(CONTENT_RANGE, range.as_str())
                .body(Bytes::new())
        })
        .await
    }

    /// Stream the file into the session, resuming from the committed offset
    /// after transient failures. Returns the created file id.
    async fn send_chunks(&self, session_uri: &str, path: &Path, total: u64) -> Result<String, UploadError> {
        let mut file = fs::File::open(path).await.map_err(|e| local_io(path, e))?;
        let mut committed: u64 = 0;
        let mut failures: u32 = 0;
        let mut resync = false;

        loop {
            let sent = if resync {
                self.query_session(session_uri, total).await
            } else {
                let chunk = match read_chunk(&mut file, committed, self.chunk_size, total).await {
                    Ok(chunk) => chunk,
                    // The file changed under us; retrying later re-reads it.
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                        return Err(RemoteServiceError::TransferInterrupted {
                            committed,
                            total,
                            reason: format!("{} shrank during upload", path.display()),
                        }
                        .into())
                    }
                    Err(e) => return Err(local_io(path, e)),
                };
                self.put_chunk(session_uri, chunk, committed, total).await
            };

            let reason = match sent {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match status {
                        200 | 201 => return Ok(parse_id(response).await?),
                        308 => {
                            let offset = committed_offset(response.headers());
                            let progressed = resync || offset > committed;
                            committed = offset;
                            resync = false;
                            if progressed {
                                continue;
                            }
                            "session did not accept the chunk".to_string()
                        }
                        404 | 410 => {
                            return Err(RemoteServiceError::TransferInterrupted {
                                committed,
                                total,
                                reason: "upload session expired".to_string(),
                            }
                            .into())
                        }
                        500 | 502 | 503 | 504 => format!("server returned {}", status),
                        _ => {
                            let message = error_message(response).await;
                            return Err(RemoteServiceError::from_status(status, message).into());
                        }
                    }
                }
                Err(RemoteServiceError::Transport(reason)) => reason,
                Err(e) => return Err(e.into()),
            };

            failures += 1;
            if failures > self.max_resume_attempts {
                return Err(RemoteServiceError::TransferInterrupted {
                    committed,
                    total,
                    reason,
                }
                .into());
            }
            tracing::warn!(
                path = %path.display(),
                committed_bytes = committed,
                total_bytes = total,
                attempt = failures,
                reason = %reason,
                "Resumable upload interrupted, resuming"
            );
            resync = true;
        }
    }

    fn permission_part(grant: &PermissionGrant) -> BatchPart {
        BatchPart {
            method: "POST",
            path: format!(
                "/drive/v3/files/{}/permissions?fields=id",
                urlencoding::encode(&grant.target_container_id)
            ),
            json_body: json!({
                "type": "user",
                "role": grant.role.to_string(),
                "emailAddress": grant.grantee_identity,
            })
            .to_string(),
        }
    }
}

#[async_trait]
impl RemoteStorage for DriveStorage {
    async fn create_container(&self, name: &str) -> Result<RemoteContainer, RemoteServiceError> {
        let start = Instant::now();
        let url = format!("{}/drive/v3/files?fields=id", self.api_base_url);

        let mut metadata = json!({ "name": name, "mimeType": FOLDER_MIME_TYPE });
        if let Some(parent) = &self.parent_folder_id {
            metadata["parents"] = json!([parent]);
        }

        let response = self
            .send(|token| bearer(self.http.post(&url), token).json(&metadata))
            .await?;
        let id = parse_id(ensure_success(response).await?).await?;

        tracing::info!(
            container_id = %id,
            name = %name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive container created"
        );

        Ok(RemoteContainer {
            id,
            name: name.to_string(),
            parent_id: self.parent_folder_id.clone(),
        })
    }

    async fn upload_blob(&self, container_id: &str, path: &Path) -> Result<RemoteBlob, UploadError> {
        let media_type = media_type_for(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let total = fs::metadata(path).await.map_err(|e| local_io(path, e))?.len();
        let start = Instant::now();

        let session_uri = self.start_session(container_id, &name, media_type, total).await?;
        let id = self.send_chunks(&session_uri, path, total).await?;

        tracing::info!(
            path = %path.display(),
            blob_id = %id,
            container_id = %container_id,
            size_bytes = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive upload successful"
        );

        Ok(RemoteBlob {
            id,
            name,
            parent_container_id: container_id.to_string(),
            media_type: media_type.to_string(),
        })
    }

    async fn execute_batch(
        &self,
        grants: &[PermissionGrant],
    ) -> Result<Vec<Result<String, RemoteServiceError>>, RemoteServiceError> {
        let boundary = format!("batch_reelsync_{}", Uuid::new_v4().simple());
        let parts: Vec<BatchPart> = grants.iter().map(Self::permission_part).collect();
        let body = multipart::encode(&boundary, &parts);

        let url = format!("{}/batch/drive/v3", self.api_base_url);
        let content_type = format!("multipart/mixed; boundary={}", boundary);
        let response = self
            .send(|token| {
                bearer(self.http.post(&url), token)
                    .header(CONTENT_TYPE, content_type.as_str())
                    .body(body.clone())
            })
            .await?;
        let response = ensure_success(response).await?;

        let response_boundary = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(multipart::boundary_from_content_type)
            .ok_or_else(|| {
                RemoteServiceError::MalformedResponse(
                    "batch response is not multipart/mixed".to_string(),
                )
            })?;
        let text = response.text().await.map_err(transport)?;

        let mut outcomes: Vec<Option<Result<String, RemoteServiceError>>> =
            grants.iter().map(|_| None).collect();
        for (position, part) in multipart::decode(&response_boundary, &text)?
            .into_iter()
            .enumerate()
        {
            let index = part
                .content_id
                .as_deref()
                .and_then(multipart::item_index)
                .unwrap_or(position);
            match outcomes.get_mut(index) {
                Some(slot) => *slot = Some(part_outcome(part)),
                None => tracing::warn!(index, "Batch response part has no matching request"),
            }
        }

        Ok(outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| {
                    Err(RemoteServiceError::MalformedResponse(
                        "no response for batch item".to_string(),
                    ))
                })
            })
            .collect())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Drive
    }
}

fn bearer(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header(AUTHORIZATION, format!("Bearer {}", token))
}

fn unauthorized(e: AuthError) -> RemoteServiceError {
    RemoteServiceError::Http {
        status: 401,
        message: format!("no usable access token: {}", e),
    }
}

fn transport(e: reqwest::Error) -> RemoteServiceError {
    RemoteServiceError::Transport(e.to_string())
}

fn local_io(path: &Path, source: std::io::Error) -> UploadError {
    UploadError::LocalIo {
        path: path.to_path_buf(),
        source,
    }
}

async fn ensure_success(response: Response) -> Result<Response, RemoteServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response).await;
    Err(RemoteServiceError::from_status(status.as_u16(), message))
}

/// Prefer the API's `error.message`, fall back to the raw body.
async fn error_message(response: Response) -> String {
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    extract_message(&body)
}

fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

async fn parse_id(response: Response) -> Result<String, RemoteServiceError> {
    let parsed: IdResponse = response
        .json()
        .await
        .map_err(|e| RemoteServiceError::MalformedResponse(e.to_string()))?;
    parsed
        .id
        .ok_or_else(|| RemoteServiceError::MalformedResponse("response has no id".to_string()))
}

fn part_outcome(part: PartResponse) -> Result<String, RemoteServiceError> {
    if !(200..300).contains(&part.status) {
        return Err(RemoteServiceError::from_status(part.status, extract_message(&part.body)));
    }
    serde_json::from_str::<IdResponse>(&part.body)
        .map_err(|e| RemoteServiceError::MalformedResponse(e.to_string()))?
        .id
        .ok_or_else(|| RemoteServiceError::MalformedResponse("batch item has no id".to_string()))
}

/// Bytes committed by the session according to its `Range: bytes=0-N` header.
fn committed_offset(headers: &HeaderMap) -> u64 {
    headers
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit_once('-'))
        .and_then(|(_, last)| last.trim().parse::<u64>().ok())
        .map(|last| last + 1)
        .unwrap_or(0)
}

async fn read_chunk(
    file: &mut fs::File,
    offset: u64,
    chunk_size: u64,
    total: u64,
) -> std::io::Result<Bytes> {
    let len = chunk_size.min(total.saturating_sub(offset)) as usize;
    let mut buf = vec![0u8; len];
    file.seek(SeekFrom::Start(offset)).await?;
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}
