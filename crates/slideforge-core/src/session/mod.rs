//! Client-side session: staged attachments, transcript and the orchestrator
//! that drives the service.

mod attachment;
mod events;
mod orchestrator;
mod pipeline;
mod state;

pub use attachment::{
    ALLOWED_EXTENSIONS, Attachment, is_allowed_extension, mime_type_for_extension,
    normalize_input_path,
};
pub use events::SessionEvent;
pub use orchestrator::{GENERATE_REQUEST_TEXT, Orchestrator};
pub use pipeline::{
    GenerateReport, GeneratedDeck, PipelineRun, Rejection, Stage, StageOutcome, StagePayload,
    StageResult, SubmitReport,
};
pub use state::{
    Activity, ConversationPolicy, FileDescriptor, Message, PendingAttachments, Role,
    SessionFlags, SessionState,
};
