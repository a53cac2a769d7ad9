//! Ask command handler: one submission, optionally followed by generation.

use std::io::stdout;
use std::path::Path;

use anyhow::{Result, anyhow, bail};
use slideforge_core::client::ServiceError;
use slideforge_core::session::{GenerateReport, GeneratedDeck, SubmitReport};

use super::{RunContext, SessionOptions, download, print_json};
use crate::renderer::TranscriptRenderer;

pub struct AskOptions<'a> {
    pub message: &'a str,
    pub session: &'a SessionOptions,
    pub generate: bool,
    pub output: Option<&'a Path>,
}

pub async fn run(ctx: &RunContext, options: AskOptions<'_>) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;
    options.session.prepare(&orchestrator).await?;

    let report = orchestrator.submit(options.message).await;
    let run = match &report {
        SubmitReport::Rejected(reason) => bail!("Nothing sent: {reason}"),
        SubmitReport::Ran(run) => run,
    };
    let failed_stage = run
        .outcomes
        .iter()
        .find(|o| o.result.is_err())
        .map(|o| o.stage);

    let mut events = run.events.clone();
    let mut deck: Option<GeneratedDeck> = None;
    // `failure` is what `--json` reports; `error` is the exit status.
    let mut failure: Option<ServiceError> = run.failure().cloned();
    let mut error = failed_stage.map(|stage| anyhow!("Request failed at stage {stage}"));
    if error.is_none() && options.generate {
        let generated = orchestrator.generate().await;
        events.extend(generated.events());
        match generated {
            GenerateReport::Generated(generated) => deck = Some(generated),
            GenerateReport::Skipped(reason) => {
                failure = Some(ServiceError::precondition(reason.to_string()));
                error = Some(anyhow!("Cannot generate: {reason}"));
            }
            GenerateReport::Failed(err) => {
                failure = Some(err);
                error = Some(anyhow!("Slide generation failed"));
            }
        }
    }

    let mut saved = None;
    if let (Some(deck), Some(output)) = (&deck, options.output) {
        let service = orchestrator.service();
        saved = Some(download::save(service, &deck.download_url, Some(output)).await?);
    }

    let state = orchestrator.snapshot();
    if ctx.json {
        print_json(&serde_json::json!({
            "conversation_id": state.conversation_id(),
            "flags": state.flags(),
            "messages": state.messages(),
            "events": events,
            "deck": deck,
            "saved": saved.as_ref().map(|(path, _)| path),
            "error": failure,
        }))?;
    } else {
        TranscriptRenderer::new(stdout().lock())
            .echo_user(true)
            .render(state.messages())?;
        if let Some((path, bytes)) = &saved {
            eprintln!("Saved {} ({bytes} bytes)", path.display());
        }
        if let Some(id) = state.conversation_id() {
            eprintln!("conversation: {id}");
        }
    }

    error.map_or(Ok(()), Err)
}
