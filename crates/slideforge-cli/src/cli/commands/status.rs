//! Status command handler.

use anyhow::{Context, Result};

use super::{RunContext, print_json};

pub async fn run(ctx: &RunContext) -> Result<()> {
    let client = ctx.client()?;
    let health = client
        .health()
        .await
        .with_context(|| format!("reach SlideForge at {}", client.base_url()))?;
    // Older services have no retrieval endpoint; report it as unavailable.
    let rag = match client.rag_status().await {
        Ok(rag) => Some(rag),
        Err(err) => {
            tracing::debug!(error = %err, "retrieval status unavailable");
            None
        }
    };

    if ctx.json {
        return print_json(&serde_json::json!({
            "base_url": client.base_url(),
            "health": health,
            "rag": rag,
        }));
    }

    println!("Service:   {}", client.base_url());
    println!(
        "Status:    {} ({} {})",
        health.status, health.app, health.version
    );
    match rag {
        Some(rag) if rag.rag_available => {
            println!("Retrieval: available ({})", rag.embedding_method);
        }
        Some(_) => println!("Retrieval: disabled"),
        None => println!("Retrieval: unknown"),
    }
    Ok(())
}
