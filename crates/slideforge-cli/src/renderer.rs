//! Transcript renderer.
//!
//! Writes session messages to a single stream as they are appended. The
//! renderer remembers how many messages it has written, so callers can pass
//! the full transcript after every operation.

use std::io::{self, Write};

use slideforge_core::session::{Message, Role};

pub struct TranscriptRenderer<W> {
    out: W,
    rendered: usize,
    echo_user: bool,
}

impl<W: Write> TranscriptRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rendered: 0,
            echo_user: false,
        }
    }

    /// Also print user messages (off for the REPL, where the user just typed them).
    #[must_use]
    pub fn echo_user(mut self, echo: bool) -> Self {
        self.echo_user = echo;
        self
    }

    /// Writes messages not rendered yet. A shorter transcript than last time
    /// means the session was reset.
    pub fn render(&mut self, messages: &[Message]) -> io::Result<()> {
        if messages.len() < self.rendered {
            self.rendered = 0;
        }
        for message in &messages[self.rendered..] {
            self.write_message(message)?;
        }
        self.rendered = messages.len();
        self.out.flush()
    }

    fn write_message(&mut self, message: &Message) -> io::Result<()> {
        match message.role {
            Role::User => {
                if !self.echo_user {
                    return Ok(());
                }
                for line in message.content.lines() {
                    writeln!(self.out, "> {line}")?;
                }
            }
            Role::Assistant => {
                writeln!(self.out, "{}", message.content)?;
                if let Some(url) = &message.slide_download_url {
                    writeln!(self.out, "Download: {url}")?;
                }
            }
            Role::System => {
                writeln!(self.out, "[slideforge] {}", message.content)?;
            }
        }
        writeln!(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(renderer: &mut TranscriptRenderer<Vec<u8>>, messages: &[Message]) -> String {
        let before = renderer.out.len();
        renderer.render(messages).unwrap();
        String::from_utf8(renderer.out[before..].to_vec()).unwrap()
    }

    #[test]
    fn test_only_new_messages_are_written() {
        let mut renderer = TranscriptRenderer::new(Vec::new());
        let mut messages = vec![Message::assistant("Hello")];
        assert_eq!(render(&mut renderer, &messages), "Hello\n\n");

        messages.push(Message::system("Document analyzed"));
        assert_eq!(
            render(&mut renderer, &messages),
            "[slideforge] Document analyzed\n\n"
        );
        assert_eq!(render(&mut renderer, &messages), "");
    }

    #[test]
    fn test_user_messages_hidden_unless_echoed() {
        let messages = vec![Message::user("Uploaded document: q3.pdf\n\nSummarize")];

        let mut quiet = TranscriptRenderer::new(Vec::new());
        assert_eq!(render(&mut quiet, &messages), "");

        let mut echo = TranscriptRenderer::new(Vec::new()).echo_user(true);
        assert_eq!(
            render(&mut echo, &messages),
            "> Uploaded document: q3.pdf\n> \n> Summarize\n\n"
        );
    }

    #[test]
    fn test_download_url_follows_reply() {
        let mut renderer = TranscriptRenderer::new(Vec::new());
        let messages = vec![
            Message::assistant("Deck ready")
                .with_download_url(Some("http://localhost:8001/api/download/d.pptx".into())),
        ];
        assert_eq!(
            render(&mut renderer, &messages),
            "Deck ready\nDownload: http://localhost:8001/api/download/d.pptx\n\n"
        );
    }

    #[test]
    fn test_reset_starts_over() {
        let mut renderer = TranscriptRenderer::new(Vec::new());
        render(&mut renderer, &[Message::assistant("a"), Message::assistant("b")]);

        assert_eq!(render(&mut renderer, &[Message::assistant("c")]), "c\n\n");
    }
}
