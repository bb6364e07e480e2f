use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extension the backend accepts
const MARKDOWN_EXTENSION: &str = "md";

/// Declared media types that identify markdown
const MARKDOWN_MEDIA_TYPES: &[&str] = &["text/markdown", "text/x-markdown"];

/// Generic types that some pickers attach to `.md` files; they do not
/// contradict the extension.
const GENERIC_MEDIA_TYPES: &[&str] = &["text/plain", "application/octet-stream"];

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadableFile {
    pub name: String,
    /// Media type declared by whoever picked the file; empty when unknown
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadableFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring the media type from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Not a file path: {}", path.display()))?
            .to_string();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let media_type = media_type_for(&name).to_string();
        Ok(Self::new(name, media_type, bytes))
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Markdown means a `.md` name and a declared type that does not say
    /// otherwise.
    pub fn is_markdown(&self) -> bool {
        if self.extension().as_deref() != Some(MARKDOWN_EXTENSION) {
            return false;
        }
        let declared = essence(&self.media_type);
        declared.is_empty()
            || MARKDOWN_MEDIA_TYPES.contains(&declared.as_str())
            || GENERIC_MEDIA_TYPES.contains(&declared.as_str())
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Media type without parameters, lowercased (`Text/Markdown; charset=utf-8`
/// becomes `text/markdown`).
fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn media_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("md") | Some("markdown") => "text/markdown",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Backend acknowledgement of an upload. The client only relies on the 2xx
/// status, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub filename: Option<String>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

/// An entry of the backend's uploaded-file listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    /// Seconds since the epoch, as reported by the backend
    #[serde(default)]
    pub created_at: Option<f64>,
}

impl StoredFile {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        let secs = self.created_at?;
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        let whole = secs.trunc() as i64;
        let nanos = (secs.fract() * 1_000_000_000.0) as u32;
        DateTime::from_timestamp(whole, nanos)
    }
}
