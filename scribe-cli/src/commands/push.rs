//! One-shot upload of a text file.

use std::path::Path;

use anyhow::{bail, Result};
use scribe_types::SaveStatus;

use super::{open_session, read_text};
use crate::config::CliConfig;

pub async fn push_file(
    config: &CliConfig,
    file: &Path,
    title: Option<&str>,
    id: Option<&str>,
) -> Result<()> {
    let text = read_text(file)?;
    if id.is_none() && text.trim().is_empty() {
        bail!("{} is empty, nothing to push", file.display());
    }

    let (session, _surface) = open_session(config, id, title, &text).await?;
    if session.save_status() == SaveStatus::Idle {
        println!("{} is already up to date", file.display());
        return Ok(());
    }

    if !session.flush().await {
        bail!("could not save {}", file.display());
    }
    let doc = session.document();
    match doc.id {
        Some(id) => println!("Saved {} as post {} ({})", file.display(), id, doc.title),
        None => bail!("could not save {}: no post id was assigned", file.display()),
    }
    Ok(())
}
