//! Chat command handler: line-oriented interactive session.
//!
//! Plain lines are submitted as messages (an empty line sends staged files
//! only). Slash commands manage attachments and the session.

use std::io::{IsTerminal, Write, stderr, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use slideforge_core::client::{FilePurpose, HttpSlideClient};
use slideforge_core::session::{
    Attachment, GenerateReport, Orchestrator, SubmitReport, normalize_input_path,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{RunContext, SessionOptions, download};
use crate::renderer::TranscriptRenderer;

const HELP: &str = "\
Commands:
  /doc <path>         stage a document for the next message
  /brand <path>       stage brand guidelines for the next message
  /detach doc|brand   drop a staged file
  /generate           build the slide deck
  /download [path]    save the latest deck
  /status             show conversation, files and staged uploads
  /new                start a new session
  /help               show this help
  /quit               exit
Anything else is sent as a message. An empty line sends staged files alone.";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Submit(String),
    Attach(FilePurpose, PathBuf),
    Detach(FilePurpose),
    Generate,
    Download(Option<PathBuf>),
    Status,
    New,
    Help,
    Quit,
    /// A slash command that could not be understood, with the reason.
    Invalid(String),
}

fn parse_purpose(arg: &str) -> Option<FilePurpose> {
    match arg.to_ascii_lowercase().as_str() {
        "doc" | "document" => Some(FilePurpose::Document),
        "brand" => Some(FilePurpose::Brand),
        _ => None,
    }
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Input::Submit(line.to_string());
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, arg)| (name, arg.trim()));

    match name {
        "doc" | "brand" if arg.is_empty() => Input::Invalid(format!("usage: /{name} <path>")),
        "doc" => Input::Attach(FilePurpose::Document, normalize_input_path(arg)),
        "brand" => Input::Attach(FilePurpose::Brand, normalize_input_path(arg)),
        "detach" => parse_purpose(arg).map_or_else(
            || Input::Invalid("usage: /detach doc|brand".to_string()),
            Input::Detach,
        ),
        "generate" => Input::Generate,
        "download" if arg.is_empty() => Input::Download(None),
        "download" => Input::Download(Some(normalize_input_path(arg))),
        "status" => Input::Status,
        "new" => Input::New,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        _ => Input::Invalid(format!("unknown command /{name} (try /help)")),
    }
}

pub async fn run(ctx: &RunContext, session: &SessionOptions) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;
    session.prepare(&orchestrator).await?;

    let interactive = std::io::stdin().is_terminal();
    let mut renderer = TranscriptRenderer::new(stdout());
    if interactive {
        eprintln!(
            "SlideForge at {}. Type /help for commands.",
            orchestrator.service().base_url()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("{}", prompt(&orchestrator));
            stderr().flush().ok();
        }
        let Some(line) = lines.next_line().await.context("read input")? else {
            break;
        };

        match parse_input(&line) {
            Input::Quit => break,
            Input::Help => eprintln!("{HELP}"),
            Input::Invalid(reason) => eprintln!("{reason}"),
            Input::Attach(purpose, path) => match Attachment::from_path(&path) {
                Ok(attachment) => {
                    eprintln!("Staged {}: {}", purpose.label(), attachment.name());
                    orchestrator.attach(attachment, purpose);
                }
                Err(err) => eprintln!("{err:#}"),
            },
            Input::Detach(purpose) => {
                orchestrator.detach(purpose);
                eprintln!("Dropped staged {}", purpose.label());
            }
            Input::Submit(text) => {
                if let SubmitReport::Rejected(reason) = orchestrator.submit(&text).await {
                    // A blank line with nothing staged is just a no-op.
                    if !text.is_empty() {
                        eprintln!("Not sent: {reason}");
                    }
                }
            }
            Input::Generate => {
                if let GenerateReport::Skipped(reason) = orchestrator.generate().await {
                    eprintln!("Cannot generate: {reason}");
                }
            }
            Input::Download(output) => {
                let latest = orchestrator
                    .snapshot()
                    .latest_download_url()
                    .map(str::to_string);
                match latest {
                    Some(url) => {
                        match download::save(orchestrator.service(), &url, output.as_deref()).await
                        {
                            Ok((path, bytes)) => {
                                eprintln!("Saved {} ({bytes} bytes)", path.display());
                            }
                            Err(err) => eprintln!("{err:#}"),
                        }
                    }
                    None => eprintln!("No deck to download yet."),
                }
            }
            Input::Status => eprintln!("{}", status_line(&orchestrator)),
            Input::New => {
                if orchestrator.reset_session() {
                    eprintln!("Started a new session.");
                } else {
                    eprintln!("Cannot reset while a request is in progress.");
                }
            }
        }

        renderer
            .render(orchestrator.snapshot().messages())
            .context("write transcript")?;
    }

    if let Some(id) = orchestrator.conversation_id() {
        eprintln!("conversation: {id}");
    }
    Ok(())
}

fn prompt(orchestrator: &Orchestrator<HttpSlideClient>) -> String {
    let state = orchestrator.snapshot();
    let staged: Vec<&str> = [FilePurpose::Document, FilePurpose::Brand]
        .into_iter()
        .filter_map(|p| state.pending().get(p).map(Attachment::name))
        .collect();
    if staged.is_empty() {
        "> ".to_string()
    } else {
        format!("[{}] > ", staged.join(", "))
    }
}

fn status_line(orchestrator: &Orchestrator<HttpSlideClient>) -> String {
    let state = orchestrator.snapshot();
    let flags = state.flags();
    let mut parts = vec![format!(
        "conversation: {}",
        state.conversation_id().unwrap_or("(none)")
    )];
    parts.push(format!(
        "document: {}",
        if flags.has_document { "yes" } else { "no" }
    ));
    parts.push(format!(
        "brand: {}",
        if flags.has_brand { "yes" } else { "no" }
    ));
    for purpose in [FilePurpose::Document, FilePurpose::Brand] {
        if let Some(attachment) = state.pending().get(purpose) {
            parts.push(format!("staged {}: {}", purpose.label(), attachment.name()));
        }
    }
    if let Some(url) = state.latest_download_url() {
        parts.push(format!("deck: {url}"));
    } else if state.can_generate() {
        parts.push("deck: not generated yet (try /generate)".to_string());
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_submitted_trimmed() {
        assert_eq!(
            parse_input("  make it punchier \n"),
            Input::Submit("make it punchier".to_string())
        );
        assert_eq!(parse_input(""), Input::Submit(String::new()));
    }

    #[test]
    fn test_attach_commands() {
        assert_eq!(
            parse_input("/doc ./q3 report.pdf"),
            Input::Attach(FilePurpose::Document, PathBuf::from("./q3 report.pdf"))
        );
        assert_eq!(
            parse_input(r"/brand /tmp/Brand\ Guide.md"),
            Input::Attach(FilePurpose::Brand, PathBuf::from("/tmp/Brand Guide.md"))
        );
        assert!(matches!(parse_input("/doc"), Input::Invalid(_)));
    }

    #[test]
    fn test_detach_requires_purpose() {
        assert_eq!(
            parse_input("/detach brand"),
            Input::Detach(FilePurpose::Brand)
        );
        assert_eq!(
            parse_input("/detach Document"),
            Input::Detach(FilePurpose::Document)
        );
        assert!(matches!(parse_input("/detach"), Input::Invalid(_)));
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(parse_input("/generate"), Input::Generate);
        assert_eq!(parse_input("/download"), Input::Download(None));
        assert_eq!(
            parse_input("/download out/deck.pptx"),
            Input::Download(Some(PathBuf::from("out/deck.pptx")))
        );
        assert_eq!(parse_input("/new"), Input::New);
        assert_eq!(parse_input("/status"), Input::Status);
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/exit"), Input::Quit);
    }

    #[test]
    fn test_unknown_command() {
        let Input::Invalid(reason) = parse_input("/slides") else {
            panic!("expected invalid input");
        };
        assert!(reason.contains("/slides"));
    }
}
