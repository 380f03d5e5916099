//! CLI command implementations.

pub mod ai;
pub mod posts;
pub mod push;
pub mod watch;

pub use ai::run_ai;
pub use posts::{list_posts, publish_post, show_post};
pub use push::push_file;
pub use watch::watch_file;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use scribe_client::{AiClient, PostsClient};
use scribe_sync::EditorSession;
use scribe_types::{Document, PostId};

use crate::config::CliConfig;
use crate::surface::PlainTextSurface;

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Start an editing session on `id` (or a new draft) and load `text` into
/// it as an edit, so that the file's content is what gets saved.
pub(crate) async fn open_session(
    config: &CliConfig,
    id: Option<&str>,
    title: Option<&str>,
    text: &str,
) -> Result<(EditorSession, PlainTextSurface)> {
    let posts = Arc::new(PostsClient::new(config.client.clone())?);
    let ai = Arc::new(AiClient::new(config.client.clone())?);

    let (session, mut surface) = match id {
        Some(id) => {
            let post = posts
                .fetch_post(&PostId::new(id))
                .await
                .with_context(|| format!("failed to fetch post {id}"))?;
            let surface = PlainTextSurface::from_text(&post.plain_text);
            let session = EditorSession::open(config.sync.clone(), posts, ai, Document::from(post));
            // the surface echoing the loaded post is the baseline, not an edit
            let echo = surface.content();
            session.on_edit(echo.snapshot, echo.plain_text);
            (session, surface)
        }
        None => (
            EditorSession::new(config.sync.clone(), posts, ai),
            PlainTextSurface::default(),
        ),
    };

    if let Some(title) = title {
        if session.document().title != title {
            session.set_title(title);
        }
    }
    if surface.set_text(text) {
        let content = surface.content();
        session.on_edit(content.snapshot, content.plain_text);
    }
    Ok((session, surface))
}
