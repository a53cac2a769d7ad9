//! The submit pipeline as data.
//!
//! A submission is planned up front as an ordered list of steps
//! (document upload, brand upload, chat). Each executed step yields a
//! `StageOutcome`; the first failure stops the run and the steps that never
//! ran are listed in `PipelineRun::skipped`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::events::SessionEvent;
use super::state::{Activity, FileDescriptor, Message};
use crate::client::{ChatResponse, FilePurpose, HistoryEntry, ServiceError, UploadResponse};

/// One step of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    UploadDocument,
    UploadBrand,
    Chat,
}

impl Stage {
    pub(crate) fn activity(self) -> Activity {
        match self {
            Stage::UploadDocument | Stage::UploadBrand => Activity::Uploading,
            Stage::Chat => Activity::Sending,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::UploadDocument => write!(f, "upload_document"),
            Stage::UploadBrand => write!(f, "upload_brand"),
            Stage::Chat => write!(f, "chat"),
        }
    }
}

/// Successful payload of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagePayload {
    Upload(UploadResponse),
    Chat(ChatResponse),
}

pub type StageResult = Result<StagePayload, ServiceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    pub result: StageResult,
}

/// A planned step with the data it transmits.
#[derive(Debug)]
pub(crate) enum Step {
    Upload {
        purpose: FilePurpose,
        attachment: Attachment,
    },
    Chat {
        message: String,
        history: Vec<HistoryEntry>,
    },
}

impl Step {
    pub(crate) fn stage(&self) -> Stage {
        match self {
            Step::Upload {
                purpose: FilePurpose::Document,
                ..
            } => Stage::UploadDocument,
            Step::Upload {
                purpose: FilePurpose::Brand,
                ..
            } => Stage::UploadBrand,
            Step::Chat { .. } => Stage::Chat,
        }
    }
}

/// Snapshot taken when a submission starts.
#[derive(Debug)]
pub(crate) struct SubmitPlan {
    document: Option<Attachment>,
    brand: Option<Attachment>,
    text: String,
    history: Vec<HistoryEntry>,
}

impl SubmitPlan {
    pub(crate) fn new(
        document: Option<Attachment>,
        brand: Option<Attachment>,
        text: String,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            document,
            brand,
            text,
            history,
        }
    }

    fn has_attachments(&self) -> bool {
        self.document.is_some() || self.brand.is_some()
    }

    /// The user message appended before any network call.
    ///
    /// With attachments it summarizes them (plus any text); otherwise it is
    /// the typed text verbatim.
    pub(crate) fn opening_message(&self) -> Message {
        if !self.has_attachments() {
            return Message::user(self.text.clone());
        }

        let mut lines = Vec::new();
        let mut files = Vec::new();
        for (purpose, attachment) in [
            (FilePurpose::Document, self.document.as_ref()),
            (FilePurpose::Brand, self.brand.as_ref()),
        ] {
            if let Some(attachment) = attachment {
                lines.push(format!("Uploaded {}: {}", purpose.label(), attachment.name()));
                files.push(FileDescriptor {
                    name: attachment.name().to_string(),
                    purpose,
                });
            }
        }
        let mut content = lines.join("\n");
        if !self.text.is_empty() {
            content.push_str("\n\n");
            content.push_str(&self.text);
        }
        Message::user(content).with_files(files)
    }

    /// Steps in transmission order: document, brand, chat.
    pub(crate) fn into_steps(self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(3);
        if let Some(attachment) = self.document {
            steps.push(Step::Upload {
                purpose: FilePurpose::Document,
                attachment,
            });
        }
        if let Some(attachment) = self.brand {
            steps.push(Step::Upload {
                purpose: FilePurpose::Brand,
                attachment,
            });
        }
        if !self.text.is_empty() {
            steps.push(Step::Chat {
                message: self.text,
                history: self.history,
            });
        }
        steps
    }
}

/// Why an operation did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Another operation is in flight.
    Busy,
    /// No text and no pending attachment.
    Empty,
    /// No conversation id yet.
    NoConversation,
    /// The service has no document for this conversation.
    NoDocument,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Busy => write!(f, "another request is still in progress"),
            Rejection::Empty => write!(f, "nothing to send"),
            Rejection::NoConversation => write!(f, "no conversation yet"),
            Rejection::NoDocument => write!(f, "upload a document first"),
        }
    }
}

/// Record of an accepted submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineRun {
    /// Executed stages in order. Only the last one can be a failure.
    pub outcomes: Vec<StageOutcome>,
    /// Planned stages that never ran because an earlier one failed.
    pub skipped: Vec<Stage>,
    pub events: Vec<SessionEvent>,
}

impl PipelineRun {
    pub fn failure(&self) -> Option<&ServiceError> {
        self.outcomes.iter().find_map(|o| o.result.as_ref().err())
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.outcomes.iter().map(|o| o.stage).collect()
    }

    /// The chat reply, if the chat stage ran and succeeded.
    pub fn reply(&self) -> Option<&ChatResponse> {
        self.outcomes.iter().find_map(|o| match &o.result {
            Ok(StagePayload::Chat(reply)) => Some(reply),
            _ => None,
        })
    }
}

/// Result of `Orchestrator::submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    Rejected(Rejection),
    Ran(PipelineRun),
}

impl SubmitReport {
    pub fn run(&self) -> Option<&PipelineRun> {
        match self {
            SubmitReport::Ran(run) => Some(run),
            SubmitReport::Rejected(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ServiceError> {
        self.run().and_then(PipelineRun::failure)
    }
}

/// Deck announced by a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDeck {
    pub title: String,
    pub num_slides: u32,
    /// Absolute URL.
    pub download_url: String,
}

/// Result of `Orchestrator::generate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateReport {
    Skipped(Rejection),
    Generated(GeneratedDeck),
    Failed(ServiceError),
}

impl GenerateReport {
    /// Events for this outcome. A skipped request produced none.
    pub fn events(&self) -> Vec<SessionEvent> {
        match self {
            GenerateReport::Skipped(_) => Vec::new(),
            GenerateReport::Generated(deck) => vec![SessionEvent::DeckGenerated {
                title: deck.title.clone(),
                num_slides: deck.num_slides,
                download_url: deck.download_url.clone(),
            }],
            GenerateReport::Failed(error) => vec![SessionEvent::Failed {
                error: error.clone(),
            }],
        }
    }
}
