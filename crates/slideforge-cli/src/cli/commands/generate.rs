//! Generate command handler.

use std::path::Path;

use anyhow::{Context, Result, bail};
use slideforge_core::session::GenerateReport;

use super::{RunContext, download, print_json};

pub async fn run(ctx: &RunContext, conversation_id: &str, output: Option<&Path>) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;
    orchestrator
        .resume(conversation_id)
        .await
        .with_context(|| format!("resume conversation '{conversation_id}'"))?;

    let deck = match orchestrator.generate().await {
        GenerateReport::Generated(deck) => deck,
        GenerateReport::Skipped(reason) => bail!("Cannot generate: {reason}"),
        GenerateReport::Failed(err) => {
            return Err(err).context("generate slides");
        }
    };

    let mut saved = None;
    if let Some(output) = output {
        let service = orchestrator.service();
        saved = Some(download::save(service, &deck.download_url, Some(output)).await?);
    }

    if ctx.json {
        return print_json(&serde_json::json!({
            "conversation_id": conversation_id,
            "deck": deck,
            "saved": saved.as_ref().map(|(path, _)| path),
        }));
    }

    println!("{} ({} slides)", deck.title, deck.num_slides);
    println!("Download: {}", deck.download_url);
    if let Some((path, bytes)) = saved {
        println!("Saved {} ({bytes} bytes)", path.display());
    }
    Ok(())
}
