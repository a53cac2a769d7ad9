//! SlideForge service client.
//!
//! `SlideService` is the seam between the session orchestrator and the
//! remote service. `HttpSlideClient` is the production implementation.

mod http;
pub mod shared;
pub mod types;

use async_trait::async_trait;
pub use http::HttpSlideClient;
pub use shared::{
    BASE_URL_ENV, DEFAULT_BASE_URL, ServiceError, ServiceErrorKind, ServiceResult, USER_AGENT,
    build_download_url, resolve_base_url, validate_url,
};
pub use types::{
    ChatRequest, ChatResponse, FilePurpose, GenerateResponse, Health, HistoryEntry, RagStatus,
    SessionInfo, SessionList, SessionSummary, UploadResponse,
};

use crate::session::Attachment;

/// Remote operations consumed by the session orchestrator.
#[async_trait]
pub trait SlideService: Send + Sync {
    /// Uploads a document or brand file, optionally into an existing conversation.
    async fn upload_file(
        &self,
        attachment: &Attachment,
        purpose: FilePurpose,
        conversation_id: Option<&str>,
    ) -> ServiceResult<UploadResponse>;

    /// Sends one chat turn.
    async fn send_chat(&self, request: &ChatRequest) -> ServiceResult<ChatResponse>;

    /// Asks the service to build a deck for the conversation.
    async fn generate_slides(&self, conversation_id: &str) -> ServiceResult<GenerateResponse>;

    /// Fetches what the service knows about a conversation.
    async fn session_info(&self, conversation_id: &str) -> ServiceResult<SessionInfo>;

    /// Resolves a service-relative download path to an absolute URL.
    fn download_url(&self, path: &str) -> String;
}
