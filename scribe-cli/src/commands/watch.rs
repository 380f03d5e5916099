//! Auto-save a text file into a post on every change.

use std::path::Path;

use anyhow::{bail, Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use scribe_sync::{EditorSession, StateEvent};
use scribe_types::SaveStatus;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{open_session, read_text};
use crate::config::CliConfig;

pub async fn watch_file(
    config: &CliConfig,
    file: &Path,
    title: Option<&str>,
    id: Option<&str>,
) -> Result<()> {
    let path = file
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", file.display()))?;
    let dir = path
        .parent()
        .context("watched file has no parent directory")?
        .to_path_buf();

    let text = read_text(&path)?;
    let (session, mut surface) = open_session(config, id, title, &text).await?;
    let mut events = session.events();

    // Watch the directory: editors often save by replacing the file.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize watcher")?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {:?}", dir))?;

    println!("Watching {} for changes (Ctrl+C to stop)...", path.display());
    println!("{}", status_line(&session, session.save_status()));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            Some(res) = rx.recv() => match res {
                Ok(event) if touches(&event, &path) => match read_text(&path) {
                    Ok(text) => {
                        if surface.set_text(&text) {
                            let content = surface.content();
                            session.on_edit(content.snapshot, content.plain_text);
                        }
                    }
                    Err(err) => debug!(error = %err, "file not readable yet"),
                },
                Ok(_) => {}
                Err(err) => warn!(error = %err, "watcher error"),
            },
            event = events.recv() => match event {
                Ok(StateEvent::StatusChanged { to, .. }) => println!("{}", status_line(&session, to)),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "status events lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    drop(watcher);
    println!("Saving pending changes...");
    if !session.flush().await {
        bail!("last changes to {} could not be saved", path.display());
    }
    Ok(())
}

fn touches(event: &Event, path: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == path.file_name())
}

fn status_line(session: &EditorSession, status: SaveStatus) -> String {
    let doc = session.document();
    let post = doc
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(new draft)".to_string());
    let label = match status {
        SaveStatus::Idle => "idle",
        SaveStatus::Pending => "unsaved changes",
        SaveStatus::Saving => "saving...",
        SaveStatus::Saved => "saved",
        SaveStatus::Error => "save failed, will retry on next change",
    };
    format!("[{post}] {label}")
}
