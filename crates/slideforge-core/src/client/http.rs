use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use super::shared::{ServiceError, ServiceResult, USER_AGENT, build_download_url};
use super::types::{
    ChatRequest, ChatResponse, FilePurpose, GenerateResponse, Health, RagStatus, SessionInfo,
    SessionList, UploadResponse,
};
use super::SlideService;
use crate::config::Config;
use crate::session::Attachment;

/// HTTP client for the SlideForge service.
///
/// Every request shares one fixed timeout. Nothing is retried; a timeout is
/// reported like any other failure.
#[derive(Debug, Clone)]
pub struct HttpSlideClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSlideClient {
    /// Creates a client for `base_url` with the given per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Creates a client from config (base URL precedence: env > config > default).
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.effective_base_url()?, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /`
    pub async fn health(&self) -> ServiceResult<Health> {
        let action = "checking service health";
        let response = self
            .http
            .get(self.endpoint("/"))
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e, action))?;
        decode_json(response, action).await
    }

    /// `GET /api/rag-status`
    pub async fn rag_status(&self) -> ServiceResult<RagStatus> {
        let action = "checking retrieval status";
        let response = self
            .http
            .get(self.endpoint("/api/rag-status"))
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e, action))?;
        decode_json(response, action).await
    }

    /// `GET /api/sessions`
    pub async fn list_sessions(&self) -> ServiceResult<SessionList> {
        let action = "listing sessions";
        let response = self
            .http
            .get(self.endpoint("/api/sessions"))
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e, action))?;
        decode_json(response, action).await
    }

    /// Streams a generated deck to `dest`. Returns the number of bytes written.
    ///
    /// `path_or_url` may be service-relative (`/api/download/x.pptx`) or absolute.
    ///
    /// # Errors
    /// Returns an error if the request fails or the file cannot be written.
    pub async fn download(&self, path_or_url: &str, dest: &Path) -> Result<u64> {
        let action = "downloading the slide deck";
        let url = self.download_url(path_or_url);
        tracing::debug!(%url, dest = %dest.display(), "downloading deck");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e, action))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::http_status(status.as_u16(), &body).into());
        }

        // `dest` only appears once the whole body has arrived.
        let partial = partial_path(dest);
        let written = match write_stream(response, &partial, action).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    tracing::debug!(
                        path = %partial.display(),
                        error = %cleanup,
                        "partial download not removed"
                    );
                }
                return Err(err);
            }
        };
        tokio::fs::rename(&partial, dest)
            .await
            .with_context(|| format!("rename {} to {}", partial.display(), dest.display()))?;
        Ok(written)
    }
}

/// `deck.pptx` -> `deck.pptx.part`, next to the destination.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest.with_file_name(name)
}

async fn write_stream(response: reqwest::Response, path: &Path, action: &str) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("create {}", path.display()))?;
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ServiceError::from_reqwest(&e, action))?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(written)
}

#[async_trait]
impl SlideService for HttpSlideClient {
    async fn upload_file(
        &self,
        attachment: &Attachment,
        purpose: FilePurpose,
        conversation_id: Option<&str>,
    ) -> ServiceResult<UploadResponse> {
        let action = "uploading a file";
        let mut part =
            Part::bytes(attachment.bytes().to_vec()).file_name(attachment.name().to_string());
        if let Some(mime) = attachment.mime_type() {
            part = part.mime_str(mime).map_err(|e| {
                ServiceError::precondition(format!("Invalid MIME type '{mime}'"))
                    .with_details(e.to_string())
            })?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("file_purpose", purpose.as_str());
        let mut query = vec![("file_purpose", purpose.as_str())];
        if let Some(id) = conversation_id {
            form = form.text("conversation_id", id.to_string());
            query.push(("conversation_id", id));
        }

        tracing::debug!(
            file = attachment.name(),
            %purpose,
            bytes = attachment.len(),
            conversation_id,
            "uploading file"
        );
        // The service reads purpose and id from the query string.
        let response = self
            .http
            .post(self.endpoint("/api/upload"))
            .query(&query)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e, action))?;
        decode_json(response, action).await
    }

    async fn send_chat(&self, request: &ChatRequest) -> ServiceResult<ChatResponse> {
        let action = "sending a chat message";
        tracing::debug!(
            conversation_id = request.conversation_id.as_deref(),
            history = request.history.len(),
            "sending chat message"
        );
        let response = self
            .http
            .post(self.endpoint("/api/chat"))
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e, action))?;
        decode_json(response, action).await
    }

    async fn generate_slides(&self, conversation_id: &str) -> ServiceResult<GenerateResponse> {
        let action = "generating slides";
        tracing::debug!(conversation_id, "requesting slide generation");
        let response = self
            .http
            .post(self.endpoint("/api/generate-slides"))
            .query(&[("conversation_id", conversation_id)])
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e, action))?;
        decode_json(response, action).await
    }

    async fn session_info(&self, conversation_id: &str) -> ServiceResult<SessionInfo> {
        let action = "loading session info";
        let response = self
            .http
            .get(self.endpoint(&format!("/api/session/{conversation_id}")))
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e, action))?;
        decode_json(response, action).await
    }

    fn download_url(&self, path: &str) -> String {
        build_download_url(&self.base_url, path)
    }
}

/// Checks the status and decodes a JSON body.
async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
    action: &str,
) -> ServiceResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = ServiceError::http_status(status.as_u16(), &body);
        tracing::debug!(status = status.as_u16(), error = %err, "service returned an error");
        return Err(err);
    }

    let body = response
        .text()
        .await
        .map_err(|e| ServiceError::from_reqwest(&e, action))?;
    serde_json::from_str(&body).map_err(|e| ServiceError::parse(action, &e))
}
