//! Request and response bodies of the SlideForge HTTP API.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::Role;

/// Why a file is uploaded. Sent as the `file_purpose` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilePurpose {
    /// Source material the deck is built from
    Document,
    /// Brand guidelines (colors, fonts, tone)
    Brand,
}

impl FilePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            FilePurpose::Document => "document",
            FilePurpose::Brand => "brand",
        }
    }

    /// Human-readable label for transcripts.
    pub fn label(self) -> &'static str {
        match self {
            FilePurpose::Document => "document",
            FilePurpose::Brand => "brand guidelines",
        }
    }
}

impl fmt::Display for FilePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_type: String,
    /// Analysis text; only shown to the user for documents.
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// One prior turn sent as chat context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Set when the reply triggered deck generation on the service side.
    #[serde(default)]
    pub slide_ready: bool,
    #[serde(default)]
    pub slide_download_url: Option<String>,
}

/// Response of `POST /api/generate-slides`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub download_url: String,
    #[serde(default)]
    pub num_slides: u32,
    #[serde(default)]
    pub deck_title: String,
}

/// Response of `GET /api/session/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    pub id: String,
    pub documents: Vec<String>,
    pub has_brand_info: bool,
    pub has_summary: bool,
    pub has_deck: bool,
    pub message_count: usize,
    pub rag_chunks: usize,
    pub rag_enabled: bool,
}

/// Entry of `GET /api/sessions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSummary {
    pub conversation_id: String,
    pub documents: Vec<String>,
    pub has_brand: bool,
    pub rag_chunks: usize,
}

/// Response of `GET /api/sessions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionList {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

/// Response of `GET /api/rag-status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagStatus {
    pub rag_available: bool,
    pub embedding_method: String,
}

/// Response of `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    pub status: String,
    pub app: String,
    pub version: String,
}
