//! Files staged for upload.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Extensions the service accepts for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "txt", "md", "pptx"];

/// A user-selected file held in memory until it is transmitted.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    mime_type: Option<String>,
    bytes: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from raw bytes. The MIME type is inferred from
    /// the file name when it has a known extension.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_type_for_extension(&name).map(str::to_string);
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    /// Returns an error if the extension is not accepted by the service or
    /// the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Not a file path: {}", path.display()))?
            .to_string();

        if !is_allowed_extension(&name) {
            bail!(
                "Unsupported file type: {}. Allowed: {}",
                path.display(),
                ALLOWED_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Returns true if the service accepts files with this name's extension.
pub fn is_allowed_extension(name: &str) -> bool {
    extension(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Returns MIME type inferred from file extension for supported upload formats.
#[must_use]
pub fn mime_type_for_extension(name: &str) -> Option<&'static str> {
    match extension(name)?.as_str() {
        "pdf" => Some("application/pdf"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "doc" => Some("application/msword"),
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "pptx" => {
            Some("application/vnd.openxmlformats-officedocument.presentationml.presentation")
        }
        _ => None,
    }
}

/// Normalizes user-provided file paths.
///
/// Handles common drag-and-drop shell escaping (`\ `, `\(`, `\)`), strips
/// surrounding quotes and expands `~/` to the HOME directory when available.
#[must_use]
pub fn normalize_input_path(path: &str) -> PathBuf {
    let trimmed = path.trim().trim_matches(|c| c == '"' || c == '\'');
    let unescaped = trimmed
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    if let Some(rest) = unescaped.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(rest);
    }

    PathBuf::from(unescaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_inferred_from_name() {
        let attachment = Attachment::new("Report.PDF", vec![1, 2, 3]);
        assert_eq!(attachment.mime_type(), Some("application/pdf"));
        assert_eq!(attachment.len(), 3);

        let unknown = Attachment::new("notes", Vec::new());
        assert_eq!(unknown.mime_type(), None);
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_from_path_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        fs::write(&path, b"png").unwrap();

        let err = Attachment::from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.md");
        fs::write(&path, "# Q3 plan").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.name(), "brief.md");
        assert_eq!(attachment.bytes(), b"# Q3 plan");
        assert_eq!(attachment.mime_type(), Some("text/markdown"));
    }

    #[test]
    fn test_normalize_input_path_unescapes() {
        assert_eq!(
            normalize_input_path(r"/tmp/My\ Deck\ \(v2\).pdf"),
            PathBuf::from("/tmp/My Deck (v2).pdf")
        );
        assert_eq!(
            normalize_input_path("'/tmp/brief.md'"),
            PathBuf::from("/tmp/brief.md")
        );
    }

    #[test]
    fn test_debug_hides_bytes() {
        let attachment = Attachment::new("a.txt", vec![0; 1024]);
        let debug = format!("{attachment:?}");
        assert!(debug.contains("len: 1024"));
    }
}
