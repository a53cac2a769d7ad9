//! Download command handler.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use slideforge_core::client::{HttpSlideClient, SlideService};

use super::{RunContext, print_json};

const FALLBACK_FILE_NAME: &str = "slides.pptx";

pub async fn run(ctx: &RunContext, url: &str, output: Option<&Path>) -> Result<()> {
    let client = ctx.client()?;
    let (dest, bytes) = save(&client, url, output).await?;
    if ctx.json {
        print_json(&serde_json::json!({
            "url": client.download_url(url),
            "path": dest,
            "bytes": bytes,
        }))
    } else {
        println!("Saved {} ({bytes} bytes)", dest.display());
        Ok(())
    }
}

/// Streams a deck to `output`, or to a file named after the URL in the
/// current directory.
pub async fn save(
    client: &HttpSlideClient,
    url: &str,
    output: Option<&Path>,
) -> Result<(PathBuf, u64)> {
    let dest = output.map_or_else(|| default_file_name(url), Path::to_path_buf);
    let bytes = client
        .download(url, &dest)
        .await
        .with_context(|| format!("download {url}"))?;
    tracing::info!(path = %dest.display(), bytes, "deck saved");
    Ok((dest, bytes))
}

/// Last path segment of a download URL, without query or fragment.
pub fn default_file_name(url: &str) -> PathBuf {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        PathBuf::from(FALLBACK_FILE_NAME)
    } else {
        PathBuf::from(name)
    }
}
