//! CLI command handlers.

pub mod ask;
pub mod chat;
pub mod config;
pub mod download;
pub mod generate;
pub mod session;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use slideforge_core::client::{FilePurpose, HttpSlideClient, validate_url};
use slideforge_core::config::Config;
use slideforge_core::session::{Attachment, Orchestrator};

/// Settings shared by every command.
pub struct RunContext {
    pub config: Config,
    /// `--base-url`, which beats both env and config.
    pub base_url: Option<String>,
    pub json: bool,
}

impl RunContext {
    pub fn client(&self) -> Result<HttpSlideClient> {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                validate_url(url)?;
                HttpSlideClient::new(url, self.config.request_timeout())
            }
            _ => HttpSlideClient::from_config(&self.config),
        }
    }

    pub fn orchestrator(&self) -> Result<Orchestrator<HttpSlideClient>> {
        Ok(Orchestrator::new(self.client()?).with_policy(self.config.conversation_policy))
    }
}

/// Files to stage and a conversation to continue before the first message.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub doc: Option<PathBuf>,
    pub brand: Option<PathBuf>,
    pub conversation: Option<String>,
}

impl SessionOptions {
    /// Resumes the conversation (if any) and stages the files.
    pub async fn prepare(&self, orchestrator: &Orchestrator<HttpSlideClient>) -> Result<()> {
        if let Some(id) = &self.conversation {
            orchestrator
                .resume(id)
                .await
                .with_context(|| format!("resume conversation '{id}'"))?;
        }
        for (path, purpose) in [
            (&self.doc, FilePurpose::Document),
            (&self.brand, FilePurpose::Brand),
        ] {
            if let Some(path) = path {
                orchestrator.attach(Attachment::from_path(path)?, purpose);
            }
        }
        Ok(())
    }
}

pub fn print_json(value: &serde_json::Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{rendered}");
    Ok(())
}
