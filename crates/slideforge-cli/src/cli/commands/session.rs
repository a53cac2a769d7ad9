//! Session command handlers.

use anyhow::{Context, Result};
use slideforge_core::client::SlideService;

use super::{RunContext, print_json};

pub async fn list(ctx: &RunContext) -> Result<()> {
    let list = ctx
        .client()?
        .list_sessions()
        .await
        .context("list sessions")?;

    if ctx.json {
        return print_json(&serde_json::to_value(&list)?);
    }
    if list.sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }
    for session in &list.sessions {
        let documents = if session.documents.is_empty() {
            "-".to_string()
        } else {
            session.documents.join(", ")
        };
        let brand = if session.has_brand { "brand" } else { "-" };
        println!("{}  {}  {}", session.conversation_id, documents, brand);
    }
    Ok(())
}

pub async fn show(ctx: &RunContext, id: &str) -> Result<()> {
    let info = ctx
        .client()?
        .session_info(id)
        .await
        .with_context(|| format!("load session '{id}'"))?;

    if ctx.json {
        return print_json(&serde_json::to_value(&info)?);
    }

    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    println!("Conversation: {}", info.id);
    if info.documents.is_empty() {
        println!("Documents:    -");
    } else {
        println!("Documents:    {}", info.documents.join(", "));
    }
    println!("Summary:      {}", yes_no(info.has_summary));
    println!("Brand:        {}", yes_no(info.has_brand_info));
    println!("Deck:         {}", yes_no(info.has_deck));
    println!("Messages:     {}", info.message_count);
    if info.rag_enabled {
        println!("Chunks:       {}", info.rag_chunks);
    }
    Ok(())
}
