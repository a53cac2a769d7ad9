//! Session orchestrator.
//!
//! Owns the session state and sequences upload, chat and generate calls
//! against a `SlideService`. The state lock is never held across an await,
//! so `attach`, `detach` and `snapshot` stay usable while a submission is in
//! flight. The busy flag serializes `submit` and `generate`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::attachment::Attachment;
use super::events::SessionEvent;
use super::pipeline::{
    GenerateReport, GeneratedDeck, PipelineRun, Rejection, Stage, StageOutcome, StagePayload,
    StageResult, Step, SubmitPlan, SubmitReport,
};
use super::state::{Activity, ConversationPolicy, Message, SessionFlags, SessionState};
use crate::client::{ChatRequest, FilePurpose, ServiceError, ServiceResult, SessionInfo, SlideService};

/// Text of the synthetic user message that precedes a generate call.
pub const GENERATE_REQUEST_TEXT: &str = "Generate the slide deck";

/// Holds the session busy. Dropping it, including when the owning future is
/// cancelled, returns the session to idle.
///
/// Must not be dropped while the state lock is held by the same task.
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl<'a> BusyGuard<'a> {
    /// Marks `state` busy with `activity`. Takes the already-held lock so the
    /// busy check and the transition happen in one critical section.
    fn enter(
        state: &'a Mutex<SessionState>,
        locked: &mut SessionState,
        activity: Activity,
    ) -> Self {
        locked.set_activity(activity);
        Self { state }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_activity(Activity::Idle);
    }
}

pub struct Orchestrator<S> {
    service: S,
    policy: ConversationPolicy,
    state: Mutex<SessionState>,
}

impl<S: SlideService> Orchestrator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            policy: ConversationPolicy::default(),
            state: Mutex::new(SessionState::default()),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ConversationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state for rendering.
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.lock().conversation_id().map(str::to_string)
    }

    /// Stages a file for the next submission, replacing any file already
    /// staged for the same purpose.
    pub fn attach(&self, attachment: Attachment, purpose: FilePurpose) {
        tracing::debug!(file = attachment.name(), %purpose, "attachment staged");
        self.lock().pending_mut().set(purpose, attachment);
    }

    /// Drops the staged file for `purpose`, if any.
    pub fn detach(&self, purpose: FilePurpose) {
        self.lock().pending_mut().clear(purpose);
    }

    /// Sends staged attachments and/or a chat message.
    ///
    /// Failures never escape: they end the run, are recorded in the report
    /// and appear in the transcript as one system message.
    pub async fn submit(&self, text: &str) -> SubmitReport {
        let text = text.trim();
        let (steps, busy) = {
            let mut state = self.lock();
            if state.is_busy() {
                return SubmitReport::Rejected(Rejection::Busy);
            }
            if text.is_empty() && state.pending().is_empty() {
                return SubmitReport::Rejected(Rejection::Empty);
            }

            let (document, brand) = state.pending_mut().take().into_parts();
            let plan = SubmitPlan::new(document, brand, text.to_string(), state.chat_history());
            state.push(plan.opening_message());
            let steps = plan.into_steps();
            let activity = steps
                .first()
                .map_or(Activity::Sending, |first| first.stage().activity());
            let busy = BusyGuard::enter(&self.state, &mut state, activity);
            (steps, busy)
        };

        let mut run = PipelineRun::default();
        let mut steps = steps.into_iter();
        while let Some(step) = steps.next() {
            let stage = step.stage();
            self.lock().set_activity(stage.activity());

            let result = self.execute(step).await;
            let result = self.commit(stage, result, &mut run.events);
            let failed = result.is_err();
            run.outcomes.push(StageOutcome { stage, result });
            if failed {
                run.skipped = steps.by_ref().map(|s| s.stage()).collect();
                break;
            }
        }

        drop(busy);
        SubmitReport::Ran(run)
    }

    async fn execute(&self, step: Step) -> StageResult {
        let conversation_id = self.conversation_id();
        match step {
            Step::Upload {
                purpose,
                attachment,
            } => self
                .service
                .upload_file(&attachment, purpose, conversation_id.as_deref())
                .await
                .map(StagePayload::Upload),
            Step::Chat { message, history } => {
                let request = ChatRequest {
                    message,
                    conversation_id,
                    history,
                };
                self.service
                    .send_chat(&request)
                    .await
                    .map(StagePayload::Chat)
            }
        }
    }

    /// Folds one stage result into the session. Returns the result as it
    /// should be recorded (a strict-policy mismatch turns success into failure).
    fn commit(
        &self,
        stage: Stage,
        result: StageResult,
        events: &mut Vec<SessionEvent>,
    ) -> StageResult {
        let mut state = self.lock();
        let outcome = match result {
            Ok(payload) => {
                let returned = match &payload {
                    StagePayload::Upload(upload) => upload.conversation_id.as_deref(),
                    StagePayload::Chat(reply) => reply.conversation_id.as_deref(),
                };
                state
                    .reconcile_conversation(returned, self.policy)
                    .map(|event| {
                        events.extend(event);
                        payload
                    })
            }
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(StagePayload::Upload(upload)) if stage == Stage::UploadDocument => {
                state.mark_document();
                state.push(Message::system(upload.summary.clone()));
                events.push(SessionEvent::DocumentLoaded {
                    name: upload.filename.clone(),
                    summary: upload.summary.clone(),
                });
            }
            Ok(StagePayload::Upload(upload)) => {
                state.mark_brand();
                events.push(SessionEvent::BrandLoaded {
                    name: upload.filename.clone(),
                });
            }
            Ok(StagePayload::Chat(reply)) => {
                let download_url = reply
                    .slide_download_url
                    .as_deref()
                    .filter(|url| !url.trim().is_empty())
                    .map(|url| self.service.download_url(url));
                state.push(
                    Message::assistant(reply.reply.clone()).with_download_url(download_url.clone()),
                );
                events.push(SessionEvent::ReplyReceived {
                    slide_ready: reply.slide_ready,
                    download_url,
                });
            }
            Err(err) => {
                tracing::warn!(%stage, kind = %err.kind, error = %err, "stage failed");
                state.push(Message::error(err));
                events.push(SessionEvent::Failed { error: err.clone() });
            }
        }
        outcome
    }

    /// Asks the service for a deck. Requires a known conversation with a
    /// document; otherwise nothing happens.
    pub async fn generate(&self) -> GenerateReport {
        let (conversation_id, busy) = {
            let mut state = self.lock();
            if state.is_busy() {
                return GenerateReport::Skipped(Rejection::Busy);
            }
            let Some(id) = state.conversation_id().map(str::to_string) else {
                return GenerateReport::Skipped(Rejection::NoConversation);
            };
            if !state.flags().has_document {
                return GenerateReport::Skipped(Rejection::NoDocument);
            }
            state.push(Message::user(GENERATE_REQUEST_TEXT));
            let busy = BusyGuard::enter(&self.state, &mut state, Activity::Generating);
            (id, busy)
        };

        let result = self.service.generate_slides(&conversation_id).await;
        let report = {
            let mut state = self.lock();
            match result {
                Ok(response) => {
                    let deck = GeneratedDeck {
                        title: response.deck_title,
                        num_slides: response.num_slides,
                        download_url: self.service.download_url(&response.download_url),
                    };
                    tracing::info!(
                        conversation_id = %conversation_id,
                        title = %deck.title,
                        slides = deck.num_slides,
                        "slide deck generated"
                    );
                    state.push(
                        Message::assistant(format!(
                            "Your slide deck \"{}\" is ready ({} slides).",
                            deck.title, deck.num_slides
                        ))
                        .with_download_url(Some(deck.download_url.clone())),
                    );
                    GenerateReport::Generated(deck)
                }
                Err(err) => {
                    tracing::warn!(kind = %err.kind, error = %err, "slide generation failed");
                    state.push(Message::error(&err));
                    GenerateReport::Failed(err)
                }
            }
        };
        // Outside the lock, after the transcript update.
        drop(busy);
        report
    }

    /// Returns to the empty initial state. Refused while an operation is in
    /// flight; returns whether the reset happened.
    pub fn reset_session(&self) -> bool {
        let mut state = self.lock();
        if state.is_busy() {
            return false;
        }
        state.reset();
        true
    }

    /// Continues a conversation the service already knows.
    ///
    /// Only valid on a fresh session. Seeds the conversation id and the
    /// document/brand flags from the service's session info.
    ///
    /// # Errors
    /// Returns a precondition error if this session already has a conversation
    /// or is busy, or the service error if the lookup fails.
    pub async fn resume(&self, conversation_id: &str) -> ServiceResult<SessionInfo> {
        {
            let state = self.lock();
            if state.is_busy() || state.conversation_id().is_some() {
                return Err(ServiceError::precondition(
                    "A conversation is already active in this session",
                ));
            }
        }

        let info = self.service.session_info(conversation_id).await?;

        let mut state = self.lock();
        if state.conversation_id().is_some() {
            return Err(ServiceError::precondition(
                "A conversation is already active in this session",
            ));
        }
        state.seed(
            conversation_id,
            SessionFlags {
                has_document: info.has_summary,
                has_brand: info.has_brand_info,
            },
        );
        tracing::info!(conversation_id, "resumed conversation");
        Ok(info)
    }
}
