//! File transfer between the chat and the workspace.
//!
//! Inbound photos/documents land in the downloads directory so the
//! subprocess can `Read` them; files the assistant writes go back to the
//! chat after the final reply.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{Document, PhotoSize};
use tracing::{info, warn};

use super::outbound::ChatOutput;

/// Extensions sent back as photos instead of documents.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "svg"];

/// Bot API upload caps.
const MAX_PHOTO_BYTES: u64 = 10 * 1024 * 1024;
const MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

/// Remove and recreate the downloads directory (`/clear`).
pub async fn reset_downloads_dir(dir: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir).await?;
    }
    tokio::fs::create_dir_all(dir).await
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Download a photo (the caller picks the largest size) into `dir`.
pub async fn download_photo(bot: &Bot, photo: &PhotoSize, dir: &Path) -> anyhow::Result<PathBuf> {
    let file = bot.get_file(photo.file.id.clone()).await?;
    let ext = Path::new(&file.path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg");
    let dest = dir.join(format!("photo_{}.{ext}", unix_timestamp()));
    fetch_to(bot, &file, &dest).await?;
    Ok(dest)
}

/// Download a document into `dir`, keeping its original name behind a
/// timestamp prefix to avoid collisions.
pub async fn download_document(
    bot: &Bot,
    document: &Document,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    let file = bot.get_file(document.file.id.clone()).await?;
    // file_name is caller-controlled; strip any path components.
    let name = document
        .file_name
        .as_deref()
        .and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let dest = dir.join(format!("{}_{name}", unix_timestamp()));
    fetch_to(bot, &file, &dest).await?;
    Ok(dest)
}

async fn fetch_to(bot: &Bot, file: &teloxide::types::File, dest: &Path) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut dst = tokio::fs::File::create(dest).await?;
    bot.download_file(&file.path, &mut dst).await?;
    let size = tokio::fs::metadata(dest).await.map_or(0, |m| m.len());
    info!(path = %dest.display(), size, "Downloaded file from chat");
    Ok(())
}

/// Whether a written file should go back as a photo.
fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|i| ext.eq_ignore_ascii_case(i)))
}

/// Send the files the assistant wrote during a turn back to the chat.
///
/// Relative paths resolve against the workspace; duplicates, missing files
/// and empty files are skipped. Oversized files yield a short notice
/// instead of an upload.
pub async fn send_written_files<C: ChatOutput + ?Sized>(
    chat: &C,
    workspace: &Path,
    written: &[PathBuf],
) {
    let mut seen = HashSet::new();
    for raw in written {
        let path = if raw.is_absolute() {
            raw.clone()
        } else {
            workspace.join(raw)
        };
        if !seen.insert(path.clone()) {
            continue;
        }

        let Ok(meta) = tokio::fs::metadata(&path).await else {
            warn!(path = %path.display(), "Written file not found");
            continue;
        };
        if meta.len() == 0 {
            info!(path = %path.display(), "Skipping empty file");
            continue;
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("file");
        let result = if is_image(&path) {
            if meta.len() > MAX_PHOTO_BYTES {
                chat.send_message(&format!("Image too large for Telegram (>10MB): {name}"))
                    .await
                    .map(|_| ())
            } else {
                chat.send_photo(&path).await
            }
        } else if meta.len() > MAX_DOCUMENT_BYTES {
            chat.send_message(&format!("File too large for Telegram (>50MB): {name}"))
                .await
                .map(|_| ())
        } else {
            chat.send_document(&path).await
        };

        match result {
            Ok(()) => info!(path = %path.display(), size = meta.len(), "Sent file to chat"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to send file"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn image_detection_is_case_insensitive() {
        assert!(is_image(Path::new("chart.PNG")));
        assert!(is_image(Path::new("photo.jpeg")));
        assert!(!is_image(Path::new("report.pdf")));
        assert!(!is_image(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn reset_creates_a_fresh_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("downloads");
        tokio::fs::create_dir_all(&dir).await.expect("create");
        tokio::fs::write(dir.join("stale.txt"), b"old")
            .await
            .expect("write");

        reset_downloads_dir(&dir).await.expect("reset");

        assert!(dir.exists());
        let mut entries = tokio::fs::read_dir(&dir).await.expect("read_dir");
        assert!(entries.next_entry().await.expect("entry").is_none());
    }
}
