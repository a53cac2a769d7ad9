//! Session state owned by the orchestrator.
//!
//! ```text
//! SessionState
//! ├── conversation_id: Option<String>   (server-assigned, first writer wins)
//! ├── messages: Vec<Message>            (append-only transcript)
//! ├── flags: SessionFlags               (has_document / has_brand, monotonic)
//! ├── pending: PendingAttachments       (one slot per FilePurpose)
//! └── activity: Activity                (busy indicator)
//! ```
//!
//! Fields are private; the orchestrator is the only writer. Callers read a
//! cloned snapshot through the accessors.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::events::SessionEvent;
use crate::client::{FilePurpose, HistoryEntry, ServiceError};

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Name and purpose of a file shown alongside a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub purpose: FilePurpose,
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Absolute URL of a generated deck, if this message announces one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileDescriptor>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            slide_download_url: None,
            files: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// System message reporting a failed operation.
    pub fn error(error: &ServiceError) -> Self {
        Self::system(format!("Error: {}", error.message))
    }

    #[must_use]
    pub fn with_download_url(mut self, url: Option<String>) -> Self {
        self.slide_download_url = url;
        self
    }

    #[must_use]
    pub fn with_files(mut self, files: Vec<FileDescriptor>) -> Self {
        self.files = files;
        self
    }
}

/// What the session has successfully sent to the service.
///
/// Both flags only ever go from false to true; `reset` is the way back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFlags {
    pub has_document: bool,
    pub has_brand: bool,
}

/// Busy indicator. Anything other than `Idle` blocks new submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    #[default]
    Idle,
    Uploading,
    Sending,
    Generating,
}

impl Activity {
    pub fn is_busy(self) -> bool {
        !matches!(self, Activity::Idle)
    }
}

/// Files staged for the next submission, one slot per purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingAttachments {
    document: Option<Attachment>,
    brand: Option<Attachment>,
}

impl PendingAttachments {
    pub fn get(&self, purpose: FilePurpose) -> Option<&Attachment> {
        match purpose {
            FilePurpose::Document => self.document.as_ref(),
            FilePurpose::Brand => self.brand.as_ref(),
        }
    }

    fn slot_mut(&mut self, purpose: FilePurpose) -> &mut Option<Attachment> {
        match purpose {
            FilePurpose::Document => &mut self.document,
            FilePurpose::Brand => &mut self.brand,
        }
    }

    pub(crate) fn set(&mut self, purpose: FilePurpose, attachment: Attachment) {
        *self.slot_mut(purpose) = Some(attachment);
    }

    pub(crate) fn clear(&mut self, purpose: FilePurpose) {
        *self.slot_mut(purpose) = None;
    }

    /// Empties both slots and returns their contents.
    pub(crate) fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub(crate) fn into_parts(self) -> (Option<Attachment>, Option<Attachment>) {
        (self.document, self.brand)
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_none() && self.brand.is_none()
    }
}

/// How to treat a response whose conversation id differs from the known one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPolicy {
    /// Keep the known id and report the mismatch as an event.
    #[default]
    FirstWins,
    /// Fail the stage that returned the divergent id.
    Strict,
}

/// Transient state of one SlideForge session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    conversation_id: Option<String>,
    messages: Vec<Message>,
    flags: SessionFlags,
    pending: PendingAttachments,
    activity: Activity,
}

impl SessionState {
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn flags(&self) -> SessionFlags {
        self.flags
    }

    pub fn pending(&self) -> &PendingAttachments {
        &self.pending
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn is_busy(&self) -> bool {
        self.activity.is_busy()
    }

    /// Returns true once the service has a document to build a deck from.
    pub fn can_generate(&self) -> bool {
        self.conversation_id.is_some() && self.flags.has_document
    }

    /// Latest download URL announced in the transcript.
    pub fn latest_download_url(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find_map(|m| m.slide_download_url.as_deref())
    }

    /// Transcript as chat context: everything except system messages.
    pub fn chat_history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn pending_mut(&mut self) -> &mut PendingAttachments {
        &mut self.pending
    }

    pub(crate) fn set_activity(&mut self, activity: Activity) {
        self.activity = activity;
    }

    pub(crate) fn mark_document(&mut self) {
        self.flags.has_document = true;
    }

    pub(crate) fn mark_brand(&mut self) {
        self.flags.has_brand = true;
    }

    /// Folds a conversation id returned by the service into the session.
    ///
    /// Adopts it if none is known. A differing id never replaces the known
    /// one; under `Strict` it is an error.
    pub(crate) fn reconcile_conversation(
        &mut self,
        returned: Option<&str>,
        policy: ConversationPolicy,
    ) -> Result<Option<SessionEvent>, ServiceError> {
        let Some(returned) = returned.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        if let Some(known) = self.conversation_id.as_deref() {
            if known == returned {
                return Ok(None);
            }
            tracing::warn!(
                known,
                returned,
                "service returned a different conversation id; keeping the known one"
            );
            return match policy {
                ConversationPolicy::FirstWins => Ok(Some(SessionEvent::ConversationMismatch {
                    known: known.to_string(),
                    returned: returned.to_string(),
                })),
                ConversationPolicy::Strict => {
                    Err(ServiceError::conversation_mismatch(known, returned))
                }
            };
        }

        tracing::info!(conversation_id = returned, "conversation assigned");
        self.conversation_id = Some(returned.to_string());
        Ok(Some(SessionEvent::ConversationAssigned {
            id: returned.to_string(),
        }))
    }

    /// Seeds identity and flags of a conversation the service already knows.
    pub(crate) fn seed(&mut self, conversation_id: &str, flags: SessionFlags) {
        self.conversation_id = Some(conversation_id.to_string());
        self.flags.has_document |= flags.has_document;
        self.flags.has_brand |= flags.has_brand;
    }

    /// Back to the empty initial state.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
