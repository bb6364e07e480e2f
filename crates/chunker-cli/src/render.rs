//! Plain-text rendering of flow state and backend data.

use chrono::{DateTime, Local, Utc};

use chunker_core::models::{Chunk, StoredFile};
use chunker_core::{Navigation, UploadStatus};

/// Maximum characters of a chunk title shown in a listing
const MAX_TITLE_WIDTH: usize = 48;

pub fn navigation(nav: &Navigation) -> String {
    match nav {
        Navigation::Render(route) => format!("{} (rendered)", route),
        Navigation::Redirect(route) => format!("-> redirect to {}", route),
    }
}

/// One status line, prefixed so failures stand out.
pub fn upload_status(status: &UploadStatus) -> Option<String> {
    let message = status.message()?;
    Some(match status {
        UploadStatus::Failed(_) => format!("Error: {}", message),
        _ => message,
    })
}

pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn local_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn files_table(files: &[StoredFile]) -> String {
    if files.is_empty() {
        return "No files uploaded yet".to_string();
    }
    let width = files
        .iter()
        .map(|f| f.filename.chars().count())
        .max()
        .unwrap_or(0)
        .max("FILE".len());

    let mut out = format!("{:<width$}  {:>10}  {}\n", "FILE", "SIZE", "UPLOADED");
    for file in files {
        out.push_str(&format!(
            "{:<width$}  {:>10}  {}\n",
            file.filename,
            human_size(file.size),
            local_time(file.created()),
        ));
    }
    out.trim_end().to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

pub fn chunks_table(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return "No chunks produced".to_string();
    }
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&format!(
            "{:>3}  {:<width$}  {:>6} chars  {}\n",
            chunk.index + 1,
            truncate(chunk.title_display(), MAX_TITLE_WIDTH),
            chunk.size,
            chunk.id,
            width = MAX_TITLE_WIDTH,
        ));
    }
    out.push_str(&format!("{} chunks", chunks.len()));
    out
}
