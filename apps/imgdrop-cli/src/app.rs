//! Subcommand implementations.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use imgdrop_toast::{Toast, ToastKind, Toasts};
use imgdrop_tracker::{EntryId, EntryStatus, FileEntry, Tracker};
use imgdrop_transfer::{FileCandidate, FileInfo, SourceFile, format_file_size};
use imgdrop_uploader::{FileUploader, HttpStorage};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;

fn uploader(config: &Config) -> anyhow::Result<FileUploader> {
    let storage = HttpStorage::new(&config.api_base_url, config.request_timeout())
        .context("invalid api_base_url")?;
    Ok(FileUploader::new(Arc::new(storage), config.validation_options()))
}

/// `imgdrop upload <paths…>`
pub async fn upload(config: &Config, paths: &[PathBuf]) -> anyhow::Result<()> {
    let uploader = uploader(config)?;

    let files = match load_batch(&uploader, paths).await {
        Ok(files) => files,
        Err(e) => {
            print_toasts(uploader.toasts());
            return Err(e);
        }
    };
    if let Err(e) = uploader.accept(files) {
        print_toasts(uploader.toasts());
        return Err(e.into());
    }

    let cancel = CancellationToken::new();
    let render = tokio::spawn(render_progress(uploader.tracker().clone(), cancel.clone()));

    uploader.wait_idle().await;
    cancel.cancel();
    let _ = render.await;

    print_toasts(uploader.toasts());
    let entries = uploader.tracker().snapshot();
    print_grid(&entries);

    let counts = uploader.tracker().count_by_status();
    let released = uploader.teardown();
    info!(
        uploaded = counts.uploaded,
        failed = counts.failed,
        released,
        "upload run finished"
    );

    if counts.failed > 0 {
        anyhow::bail!("{} of {} uploads failed", counts.failed, entries.len());
    }
    Ok(())
}

/// Checks the batch against the limits from file metadata, then reads the
/// contents of a batch that passes.
async fn load_batch(
    uploader: &FileUploader,
    paths: &[PathBuf],
) -> anyhow::Result<Vec<SourceFile>> {
    let mut infos = Vec::with_capacity(paths.len());
    for path in paths {
        let info = FileInfo::stat(path)
            .await
            .with_context(|| format!("failed to stat {}", path.display()))?;
        infos.push(info);
    }
    uploader.check(&infos)?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = SourceFile::load(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

/// `imgdrop delete <key…>`
pub async fn delete(config: &Config, keys: &[String]) -> anyhow::Result<()> {
    let uploader = uploader(config)?;

    let mut failed = 0usize;
    for key in keys {
        if uploader.delete_key(key).await.is_err() {
            failed += 1;
        }
    }

    print_toasts(uploader.toasts());
    if failed > 0 {
        anyhow::bail!("{failed} of {} deletes failed", keys.len());
    }
    Ok(())
}

/// Prints a progress line whenever an entry's percentage moves.
async fn render_progress(tracker: Tracker, cancel: CancellationToken) {
    let mut sub = tracker.subscribe();
    let mut shown: HashMap<EntryId, u8> = HashMap::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            alive = sub.changed() => {
                if !alive {
                    break;
                }
            }
        }

        for entry in tracker.snapshot() {
            if entry.status != EntryStatus::Uploading {
                continue;
            }
            if shown.get(&entry.id) != Some(&entry.progress) {
                shown.insert(entry.id, entry.progress);
                eprintln!("{:>3}% {}", entry.progress, entry.source.name());
            }
        }
    }
}

fn print_toasts(toasts: &Toasts) {
    for toast in toasts.drain() {
        println!("{}", toast_line(&toast));
    }
}

fn toast_line(toast: &Toast) -> String {
    let tag = match toast.kind {
        ToastKind::Success => "ok",
        ToastKind::Error => "error",
    };
    match &toast.message {
        Some(message) => format!("[{tag}] {}: {message}", toast.title),
        None => format!("[{tag}] {}", toast.title),
    }
}

fn print_grid(entries: &[FileEntry]) {
    for entry in entries {
        println!("{}", grid_line(entry));
    }
}

fn grid_line(entry: &FileEntry) -> String {
    format!(
        "{:<9} {:>3}% {:>10}  {}  {}",
        entry.status.to_string(),
        entry.progress,
        format_file_size(entry.source.size()),
        entry.source.name(),
        entry.remote_key.as_deref().unwrap_or("-"),
    )
}
