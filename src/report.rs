//! Graph output: JSON records or a plain text listing.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use crate::resolver::ClipGraph;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Text,
}

/// Render the graph in the requested format. `pretty` only affects JSON.
pub fn render(graph: &ClipGraph, format: Format, pretty: bool) -> Result<String, serde_json::Error> {
    match format {
        Format::Json if pretty => serde_json::to_string_pretty(graph.clips()),
        Format::Json => serde_json::to_string(graph.clips()),
        Format::Text => Ok(render_text(graph)),
    }
}

fn render_text(graph: &ClipGraph) -> String {
    let mut out = String::new();
    for clip in graph {
        let _ = writeln!(out, "{}", clip.name);
        if !clip.next.is_empty() {
            let _ = writeln!(out, "  next:       {}", clip.next.join(", "));
        }
        if !clip.alternates.is_empty() {
            let _ = writeln!(out, "  alternates: {}", clip.alternates.join(", "));
        }
        if let Some(prev) = &clip.previous {
            let _ = writeln!(out, "  previous:   {}", prev);
        }
    }
    out
}

/// Write rendered output to `path`, or stdout when `None`.
pub fn write_output(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write output: {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("Failed to write to stdout")?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n").context("Failed to write to stdout")?;
            }
            Ok(())
        }
    }
}
