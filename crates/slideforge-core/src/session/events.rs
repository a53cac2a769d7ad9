//! Session event types.
//!
//! Orchestrator operations return the events they produced instead of
//! calling back into the presentation layer. Events are serializable for
//! JSON output.

use serde::{Deserialize, Serialize};

use crate::client::ServiceError;

/// Events emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The service assigned the conversation id for this session.
    ConversationAssigned { id: String },

    /// A response named a different conversation than the known one.
    /// The known id is kept.
    ConversationMismatch { known: String, returned: String },

    /// A document upload finished; the service can now build a deck.
    DocumentLoaded { name: String, summary: String },

    /// Brand guidelines were ingested. Not shown in the transcript.
    BrandLoaded { name: String },

    /// The assistant answered a chat message.
    ReplyReceived {
        /// True when the service built a deck as part of the reply.
        slide_ready: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        download_url: Option<String>,
    },

    /// A slide deck was generated on request.
    DeckGenerated {
        title: String,
        num_slides: u32,
        download_url: String,
    },

    /// An operation failed; the remaining steps were skipped.
    Failed { error: ServiceError },
}
