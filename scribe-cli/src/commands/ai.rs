//! Stream an AI action's output to stdout as it arrives.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use scribe_client::AiClient;
use scribe_sync::{DocumentState, EditorSurface, StreamIngestor, StreamOutcome};
use scribe_types::StreamAction;

use super::read_text;
use crate::config::CliConfig;
use crate::surface::PlainTextSurface;

pub async fn run_ai(
    config: &CliConfig,
    action: StreamAction,
    file: Option<&Path>,
    text: Option<String>,
    append: bool,
) -> Result<()> {
    let source = match (file, text) {
        (Some(path), _) => read_text(path)?,
        (None, Some(text)) => text,
        (None, None) => bail!("no text given: pass TEXT or --file"),
    };
    if source.trim().is_empty() {
        bail!("nothing to send: the text is empty");
    }

    let ai = AiClient::new(config.client.clone())?;
    let state = DocumentState::new();
    let ingestor = StreamIngestor::new(state.clone(), Arc::new(ai));
    let mut updates = state.subscribe();
    let mut handle = ingestor.open(action, source.clone());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stdout = std::io::stdout();
    let mut printed = 0;
    let mut interrupted = false;

    let outcome = loop {
        tokio::select! {
            outcome = &mut handle => break outcome.context("generation task ended abnormally")?,
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                ingestor.cancel();
            }
            Ok(()) = updates.changed() => {
                let view = updates.borrow_and_update().stream.clone();
                if view.active && view.buffer.len() > printed {
                    stdout.write_all(view.buffer[printed..].as_bytes())?;
                    stdout.flush()?;
                    printed = view.buffer.len();
                }
            }
        }
    };

    let view = state.stream();
    if let StreamOutcome::Failed(err) = &outcome {
        // with no output at all the buffer only holds the error message
        if view.error.is_none() {
            bail!("{action} failed: {err}");
        }
    }
    if view.buffer.len() > printed {
        stdout.write_all(view.buffer[printed..].as_bytes())?;
    }
    writeln!(stdout)?;

    match outcome {
        StreamOutcome::Failed(err) => bail!("{action} stopped early: {err}"),
        StreamOutcome::Cancelled => {
            eprintln!("cancelled");
            Ok(())
        }
        StreamOutcome::Completed => {
            if let (true, Some(path)) = (append, file) {
                append_output(&state, &source, path)?;
            }
            Ok(())
        }
    }
}

fn append_output(state: &DocumentState, source: &str, path: &Path) -> Result<()> {
    let Some(output) = state.take_stream_output() else {
        return Ok(());
    };
    let mut surface = PlainTextSurface::from_text(source);
    let content = surface.append_paragraph(&output);
    std::fs::write(path, format!("{}\n", content.plain_text))
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("appended to {}", path.display());
    Ok(())
}
